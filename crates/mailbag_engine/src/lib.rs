//! # Mailbag Engine
//!
//! Attachment collection and delivery pipeline for Mailbag.
//!
//! After a synchronization pass reports which items changed, this crate
//! turns those keys into deliverable attachment payloads.
//!
//! This crate provides:
//! - Bounded key resolution: child keys flatten to their top-level item
//! - Deterministic attachment selection with a MIME allow list
//! - Checksum-gated retrieval over the [`AttachmentFetcher`] boundary
//! - Batch collection with per-key failure isolation ([`Collector`])
//! - Transport-ready payload conversion ([`Payload`])
//! - Sequential delivery of one session's payloads ([`Dispatcher`])
//!
//! ## Architecture
//!
//! A [`Collector`] processes the changed keys of one session strictly in
//! input order: resolve, deduplicate, select, retrieve, convert. Fetching
//! attachment content is the only suspension point; nothing is fetched
//! concurrently, and a batch runs to completion once started.
//!
//! ## Key Invariants
//!
//! - Every payload holds content that matched its declared checksum
//! - A resolved item is collected at most once per batch
//! - No per-key failure ever fails a batch
//! - Payloads keep the order in which their keys first succeeded

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod collector;
mod config;
mod dispatch;
mod error;
mod fetch;
mod payload;
mod resolve;
mod select;

pub use checksum::md5_hex;
pub use collector::{CollectStats, CollectedItem, Collector};
pub use config::{CollectorConfig, ConfigOverlay};
pub use dispatch::{Deliverer, DispatchReport, Dispatcher, MemoryDeliverer, Recipient};
pub use error::{EngineError, EngineResult, SkipReason};
pub use fetch::{AttachmentContent, AttachmentFetcher, MemoryFetcher};
pub use payload::{Payload, PayloadEncoding};
pub use resolve::resolve_top_level;
pub use select::select_attachment;
