//! Items and their typed data fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Item type marker carried by attachment items.
pub const ATTACHMENT_TYPE: &str = "attachment";

/// How an attachment's content relates to the originating library.
///
/// Only attachments whose content was imported into the library
/// (`ImportedFile`) can be fetched and re-sent; linked modes merely point
/// somewhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// File content stored inside the library.
    ImportedFile,
    /// Snapshot of a remote page stored inside the library.
    ImportedUrl,
    /// Reference to a file outside the library.
    LinkedFile,
    /// Reference to a remote URL.
    LinkedUrl,
}

impl LinkMode {
    /// Returns the serialized name of this link mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::ImportedFile => "imported_file",
            LinkMode::ImportedUrl => "imported_url",
            LinkMode::LinkedFile => "linked_file",
            LinkMode::LinkedUrl => "linked_url",
        }
    }

    /// Parses a link mode from its serialized name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "imported_file" => Some(LinkMode::ImportedFile),
            "imported_url" => Some(LinkMode::ImportedUrl),
            "linked_file" => Some(LinkMode::LinkedFile),
            "linked_url" => Some(LinkMode::LinkedUrl),
            _ => None,
        }
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of an item's `data` fields.
///
/// Session items arrive as JSON records with an open set of fields. The
/// fields the pipeline reads are lifted into typed form here; everything
/// else is preserved untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    /// The item type, e.g. `"journalArticle"` or `"attachment"`.
    pub item_type: String,
    /// Item title, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Key of the owning top-level item. Set on child items only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_item: Option<String>,
    /// Link mode. Set on attachment items only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_mode: Option<LinkMode>,
    /// MIME type of the attachment content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Declared MD5 digest of the attachment content, as hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// Attachment filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// When the item was added to the library.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
    /// When the item was last modified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,
    /// All remaining data fields, kept as raw JSON.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A single item in a session's item graph.
///
/// Items form a shallow tree: a top-level item may carry `children`
/// (attachments, notes), and a child item points back at its owner through
/// `data.parent_item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item key within the session.
    pub key: String,
    /// Item version from the originating library.
    #[serde(default)]
    pub version: u64,
    /// The item's data fields.
    pub data: ItemData,
    /// Child items, when the session supplies them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Item>>,
}

impl Item {
    /// Creates an item with the given key and item type.
    pub fn new(key: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: 0,
            data: ItemData {
                item_type: item_type.into(),
                ..ItemData::default()
            },
            children: None,
        }
    }

    /// Creates an attachment item.
    pub fn attachment(key: impl Into<String>) -> Self {
        Self::new(key, ATTACHMENT_TYPE)
    }

    /// Sets the item version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Sets the item title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.data.title = Some(title.into());
        self
    }

    /// Sets the owning parent key.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.data.parent_item = Some(parent.into());
        self
    }

    /// Sets the link mode.
    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.data.link_mode = Some(mode);
        self
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.data.content_type = Some(content_type.into());
        self
    }

    /// Sets the declared MD5 digest.
    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.data.md5 = Some(md5.into());
        self
    }

    /// Sets the attachment filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.data.filename = Some(filename.into());
        self
    }

    /// Sets the date the item was added.
    pub fn with_date_added(mut self, date: DateTime<Utc>) -> Self {
        self.data.date_added = Some(date);
        self
    }

    /// Sets the child items.
    pub fn with_children(mut self, children: Vec<Item>) -> Self {
        self.children = Some(children);
        self
    }

    /// Appends a child item.
    pub fn push_child(&mut self, child: Item) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Returns true if this is an attachment item.
    pub fn is_attachment(&self) -> bool {
        self.data.item_type == ATTACHMENT_TYPE
    }

    /// Returns true if this item belongs to a parent.
    pub fn is_child(&self) -> bool {
        self.data.parent_item.is_some()
    }
}
