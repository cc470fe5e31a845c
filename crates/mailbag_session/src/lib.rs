//! # Mailbag Session
//!
//! Item-graph data model shared by the Mailbag delivery pipeline.
//!
//! This crate provides:
//! - [`Item`] and [`ItemData`]: session items with their typed data fields
//! - [`LinkMode`]: how an attachment's content relates to its library
//! - [`Session`]: the read-only outcome of one synchronization pass
//! - [`ItemGraph`]: the accessor the pipeline resolves keys against
//!
//! This is a pure data crate with no I/O. Field names follow the JSON
//! wire form of the originating library (`itemType`, `parentItem`,
//! `dateAdded`), so sessions deserialize directly from fetched records.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod item;
mod session;

pub use item::{Item, ItemData, LinkMode, ATTACHMENT_TYPE};
pub use session::{ItemGraph, Session};
