//! Attachment store boundary.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mailbag_session::Item;

use crate::error::{EngineError, EngineResult};

/// Content returned by an attachment store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentContent {
    /// The attachment bytes, exactly as stored.
    pub data: Vec<u8>,
}

impl AttachmentContent {
    /// Creates content from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Returns true if the store returned no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes returned.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// An attachment store produces the binary content of attachment items.
///
/// This is the engine's only suspension point. Implementations wrap
/// whatever sits behind the synchronized library: an HTTP client, a local
/// cache, or [`MemoryFetcher`] in tests. Returned bytes are unverified;
/// the collector gates them against the declared checksum afterwards.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Fetches the content of the given attachment item.
    async fn fetch(&self, attachment: &Item) -> EngineResult<AttachmentContent>;
}

/// An in-memory attachment store for tests.
///
/// Holds content per attachment key and records every fetch in request
/// order. Keys can be primed to fail instead of returning content.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    contents: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, String>>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores content for an attachment key.
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.contents.lock().unwrap().insert(key.into(), data.into());
    }

    /// Makes fetches of the given key fail with the given message.
    pub fn fail_with(&self, key: impl Into<String>, message: impl Into<String>) {
        self.failures.lock().unwrap().insert(key.into(), message.into());
    }

    /// Keys fetched so far, in request order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Number of fetches issued for the given key.
    pub fn fetch_count(&self, key: &str) -> usize {
        self.fetched
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }
}

#[async_trait]
impl AttachmentFetcher for MemoryFetcher {
    async fn fetch(&self, attachment: &Item) -> EngineResult<AttachmentContent> {
        self.fetched.lock().unwrap().push(attachment.key.clone());

        if let Some(message) = self.failures.lock().unwrap().get(&attachment.key) {
            return Err(EngineError::fetch(attachment.key.as_str(), message.as_str()));
        }

        match self.contents.lock().unwrap().get(&attachment.key) {
            Some(data) => Ok(AttachmentContent::new(data.clone())),
            None => Err(EngineError::fetch(
                attachment.key.as_str(),
                "no content stored for key",
            )),
        }
    }
}
