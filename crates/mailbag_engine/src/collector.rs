//! Batch collection over a session's changed keys.

use std::collections::HashSet;
use std::sync::Arc;

use mailbag_session::{Item, ItemGraph};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::checksum::md5_hex;
use crate::config::CollectorConfig;
use crate::error::{EngineError, EngineResult, SkipReason};
use crate::fetch::AttachmentFetcher;
use crate::payload::Payload;
use crate::resolve::resolve_top_level;
use crate::select::select_attachment;

/// One successfully collected item.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedItem {
    /// The resolved top-level item.
    pub item: Item,
    /// The attachment child that was selected and fetched.
    pub attachment: Item,
    /// Verified attachment bytes, exactly as fetched.
    pub data: Vec<u8>,
}

/// Counters accumulated by a collector across calls.
#[derive(Debug, Clone, Default)]
pub struct CollectStats {
    /// Keys examined.
    pub keys_processed: u64,
    /// Items collected successfully.
    pub collected: u64,
    /// Keys skipped because no item was found or resolution looped.
    pub skipped_missing: u64,
    /// Keys skipped because the resolved item was already collected.
    pub skipped_duplicate: u64,
    /// Keys skipped because the resolved item has no children.
    pub skipped_no_children: u64,
    /// Keys skipped because no child passed selection.
    pub skipped_no_candidate: u64,
    /// Keys whose retrieval or verification failed.
    pub failed: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Collects sendable attachments for batches of changed keys.
///
/// The collector drives the whole per-key pipeline: resolve the key to
/// its top-level item, skip duplicates, select the best attachment child,
/// fetch its content, and gate it against the declared checksum. Keys are
/// processed strictly in input order, one at a time; fetching is the only
/// point where the batch suspends.
///
/// Per-key failures are logged and absorbed. A batch never fails as a
/// whole, and a key that failed leaves no trace in the duplicate set, so
/// a later key resolving to the same item gets a fresh attempt.
pub struct Collector<G, F> {
    config: CollectorConfig,
    graph: Arc<G>,
    fetcher: Arc<F>,
    stats: RwLock<CollectStats>,
}

impl<G, F> Collector<G, F>
where
    G: ItemGraph + Send + Sync,
    F: AttachmentFetcher,
{
    /// Creates a collector over the given graph and attachment store.
    pub fn new(config: CollectorConfig, graph: G, fetcher: F) -> Self {
        Self::from_shared(config, Arc::new(graph), Arc::new(fetcher))
    }

    /// Creates a collector over shared collaborators.
    pub fn from_shared(config: CollectorConfig, graph: Arc<G>, fetcher: Arc<F>) -> Self {
        Self {
            config,
            graph,
            fetcher,
            stats: RwLock::new(CollectStats::default()),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// A snapshot of the accumulated counters.
    pub fn stats(&self) -> CollectStats {
        self.stats.read().clone()
    }

    /// Collects payloads for the given keys, in input order.
    ///
    /// Equivalent to [`collect_items`](Self::collect_items) followed by
    /// payload conversion with the configured encoding.
    pub async fn collect(&self, keys: &[String]) -> Vec<Payload> {
        self.collect_items(keys)
            .await
            .iter()
            .map(|item| Payload::from_collected(item, self.config.encoding))
            .collect()
    }

    /// Collects (item, attachment, content) triples for the given keys.
    ///
    /// Returns one entry per distinct resolved item that yielded verified
    /// content, ordered by the first key that produced it. The duplicate
    /// set lives and dies with this call; separate batches re-collect
    /// freely.
    pub async fn collect_items(&self, keys: &[String]) -> Vec<CollectedItem> {
        let mut resolved: HashSet<String> = HashSet::new();
        let mut collection: Vec<CollectedItem> = Vec::new();

        for key in keys {
            self.stats.write().keys_processed += 1;

            match self.collect_one(key, &mut resolved).await {
                Ok(Some(item)) => {
                    self.stats.write().collected += 1;
                    collection.push(item);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(key = %key, error = %error, "failed to collect item");
                    let mut stats = self.stats.write();
                    stats.failed += 1;
                    stats.last_error = Some(error.to_string());
                }
            }
        }

        collection
    }

    /// Processes a single key. `Ok(None)` means the key was skipped.
    async fn collect_one(
        &self,
        key: &str,
        resolved: &mut HashSet<String>,
    ) -> EngineResult<Option<CollectedItem>> {
        let item = match resolve_top_level(self.graph.as_ref(), key, self.config.max_parent_depth)
        {
            Ok(Some(item)) => item,
            Ok(None) => {
                self.skip(key, SkipReason::Missing, None);
                return Ok(None);
            }
            Err(error) => {
                // A looping parent chain counts as a miss, not a failure.
                self.skip(key, SkipReason::Missing, Some(&error));
                return Ok(None);
            }
        };

        if resolved.contains(&item.key) {
            self.skip(key, SkipReason::Duplicate, None);
            return Ok(None);
        }

        let Some(children) = item.children.as_deref() else {
            self.skip(key, SkipReason::NoChildren, None);
            return Ok(None);
        };

        let Some(attachment) = select_attachment(children, &self.config.mimetypes) else {
            self.skip(key, SkipReason::NoCandidate, None);
            return Ok(None);
        };

        let data = self.retrieve(attachment).await?;

        // Only a verified success claims the item for this batch.
        resolved.insert(item.key.clone());

        Ok(Some(CollectedItem {
            item: item.clone(),
            attachment: attachment.clone(),
            data,
        }))
    }

    /// Fetches the selected attachment and gates it on its checksum.
    async fn retrieve(&self, attachment: &Item) -> EngineResult<Vec<u8>> {
        debug!(key = %attachment.key, "downloading attachment");

        let content = self.fetcher.fetch(attachment).await?;

        if content.is_empty() {
            return Err(EngineError::EmptyAttachment {
                key: attachment.key.clone(),
            });
        }

        let declared = attachment
            .data
            .md5
            .as_deref()
            .ok_or_else(|| EngineError::MissingChecksum {
                key: attachment.key.clone(),
            })?;

        let computed = md5_hex(&content.data);
        if !computed.eq_ignore_ascii_case(declared.trim()) {
            return Err(EngineError::ChecksumMismatch {
                key: attachment.key.clone(),
                declared: declared.to_string(),
                computed,
            });
        }

        Ok(content.data)
    }

    /// Counts and logs a skipped key.
    fn skip(&self, key: &str, reason: SkipReason, error: Option<&EngineError>) {
        match error {
            Some(error) => warn!(key = %key, reason = %reason, error = %error, "skipping key"),
            None => debug!(key = %key, reason = %reason, "skipping key"),
        }

        let mut stats = self.stats.write();
        match reason {
            SkipReason::Missing => stats.skipped_missing += 1,
            SkipReason::Duplicate => stats.skipped_duplicate += 1,
            SkipReason::NoChildren => stats.skipped_no_children += 1,
            SkipReason::NoCandidate => stats.skipped_no_candidate += 1,
        }
    }
}
