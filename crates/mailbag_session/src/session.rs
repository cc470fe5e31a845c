//! Synchronization sessions and graph access.

use std::collections::HashMap;

use crate::item::Item;

/// Read-only access to a session's item graph.
///
/// The delivery pipeline resolves keys against this interface only; it
/// never enumerates or mutates the graph. [`Session`] is the canonical
/// implementation, and a plain `HashMap<String, Item>` works for tests.
pub trait ItemGraph {
    /// Looks up an item by key.
    fn item(&self, key: &str) -> Option<&Item>;
}

impl ItemGraph for HashMap<String, Item> {
    fn item(&self, key: &str) -> Option<&Item> {
        self.get(key)
    }
}

/// The outcome of one synchronization pass.
///
/// Holds the fetched items keyed by item key, together with the key lists
/// the pass reported as created and updated. A session is assembled once by
/// the synchronization layer and read here; the pipeline never writes
/// back into it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: String,
    items: HashMap<String, Item>,
    created: Vec<String>,
    updated: Vec<String>,
}

impl Session {
    /// Creates an empty session with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The session identifier, used in diagnostics.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Adds an item to the graph, replacing any item with the same key.
    pub fn insert(&mut self, item: Item) {
        self.items.insert(item.key.clone(), item);
    }

    /// Adds an item, builder style.
    pub fn with_item(mut self, item: Item) -> Self {
        self.insert(item);
        self
    }

    /// Records a key the pass reported as created.
    pub fn mark_created(&mut self, key: impl Into<String>) {
        self.created.push(key.into());
    }

    /// Records a key the pass reported as updated.
    pub fn mark_updated(&mut self, key: impl Into<String>) {
        self.updated.push(key.into());
    }

    /// Keys reported as created, in report order.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Keys reported as updated, in report order.
    pub fn updated(&self) -> &[String] {
        &self.updated
    }

    /// All changed keys: created first, then updated.
    ///
    /// Built fresh on every call; the result is a snapshot, not a view.
    /// Keys may repeat if the pass reported them in both lists.
    pub fn changed(&self) -> Vec<String> {
        self.created
            .iter()
            .chain(self.updated.iter())
            .cloned()
            .collect()
    }

    /// Number of items in the graph.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the graph holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemGraph for Session {
    fn item(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }
}
