//! End-to-end dispatch for one session.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use email_address::EmailAddress;
use mailbag_session::Session;
use tracing::debug;

use crate::collector::Collector;
use crate::config::CollectorConfig;
use crate::error::{EngineError, EngineResult};
use crate::fetch::AttachmentFetcher;
use crate::payload::Payload;

/// A validated delivery recipient.
///
/// Parsing rejects anything that is not a plausible email address, so a
/// dispatcher can only be built with a usable destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient(EmailAddress);

impl Recipient {
    /// The recipient address as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Recipient {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmailAddress::from_str(s)
            .map(Recipient)
            .map_err(|_| EngineError::InvalidRecipient(s.to_string()))
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery collaborator consumes finished payloads.
///
/// Implementations own their transport. The dispatcher hands over one
/// payload at a time and awaits each delivery before starting the next;
/// implementations never need to handle overlapping calls.
#[async_trait]
pub trait Deliverer: Send + Sync {
    /// Delivers one payload to the recipient.
    async fn deliver(&self, recipient: &Recipient, payload: &Payload) -> EngineResult<()>;
}

/// An in-memory deliverer for tests. Records every delivery and can be
/// primed to refuse a filename.
#[derive(Debug, Default)]
pub struct MemoryDeliverer {
    sent: Mutex<Vec<(String, Payload)>>,
    refused: Mutex<Option<String>>,
}

impl MemoryDeliverer {
    /// Creates an empty deliverer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes delivery fail for the given payload filename.
    pub fn refuse(&self, filename: impl Into<String>) {
        *self.refused.lock().unwrap() = Some(filename.into());
    }

    /// Deliveries so far, as (recipient, payload) pairs in send order.
    pub fn sent(&self) -> Vec<(String, Payload)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deliverer for MemoryDeliverer {
    async fn deliver(&self, recipient: &Recipient, payload: &Payload) -> EngineResult<()> {
        if let Some(refused) = self.refused.lock().unwrap().as_deref() {
            if refused == payload.filename {
                return Err(EngineError::delivery(
                    payload.filename.as_str(),
                    "refused by test deliverer",
                ));
            }
        }

        self.sent
            .lock()
            .unwrap()
            .push((recipient.as_str().to_string(), payload.clone()));
        Ok(())
    }
}

/// Summary of one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Items collected from the session's changed keys.
    pub collected: u64,
    /// Payloads handed to the deliverer.
    pub delivered: u64,
}

/// Drives one full run over a session: collect everything the session
/// reports as changed, then deliver the payloads one at a time.
///
/// Collection absorbs per-key failures, but delivery does not: the first
/// delivery error aborts the run and propagates to the caller, who owns
/// retry policy.
pub struct Dispatcher<F, D> {
    session: Arc<Session>,
    collector: Collector<Session, F>,
    deliverer: Arc<D>,
    recipient: Recipient,
}

impl<F, D> Dispatcher<F, D>
where
    F: AttachmentFetcher,
    D: Deliverer,
{
    /// Creates a dispatcher for one session.
    pub fn new(
        config: CollectorConfig,
        recipient: Recipient,
        session: Session,
        fetcher: F,
        deliverer: D,
    ) -> Self {
        Self::from_shared(
            config,
            recipient,
            Arc::new(session),
            Arc::new(fetcher),
            Arc::new(deliverer),
        )
    }

    /// Creates a dispatcher over shared collaborators.
    pub fn from_shared(
        config: CollectorConfig,
        recipient: Recipient,
        session: Arc<Session>,
        fetcher: Arc<F>,
        deliverer: Arc<D>,
    ) -> Self {
        let collector = Collector::from_shared(config, Arc::clone(&session), fetcher);
        Self {
            session,
            collector,
            deliverer,
            recipient,
        }
    }

    /// The underlying collector, mostly for its counters.
    pub fn collector(&self) -> &Collector<Session, F> {
        &self.collector
    }

    /// Collects and delivers everything the session reports as changed.
    ///
    /// Deliveries happen strictly sequentially, in collection order.
    pub async fn process(&self) -> EngineResult<DispatchReport> {
        debug!(session = %self.session.id(), "processing session");

        let keys = self.session.changed();
        let items = self.collector.collect_items(&keys).await;
        let encoding = self.collector.config().encoding;

        let mut delivered = 0u64;
        for item in &items {
            debug!(session = %self.session.id(), item = %item.item.key, "sending item");
            let payload = Payload::from_collected(item, encoding);
            self.deliverer.deliver(&self.recipient, &payload).await?;
            delivered += 1;
        }

        if delivered > 0 {
            debug!(session = %self.session.id(), count = delivered, "sent items");
        } else {
            debug!(session = %self.session.id(), "no items were sent");
        }

        Ok(DispatchReport {
            collected: items.len() as u64,
            delivered,
        })
    }
}
