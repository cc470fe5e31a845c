//! Key resolution against the item graph.

use std::collections::HashSet;

use mailbag_session::{Item, ItemGraph};

use crate::error::{EngineError, EngineResult};

/// Resolves `key` to its owning top-level item.
///
/// A top-level key resolves to its own item. A child key flattens upward:
/// the walk follows `data.parent_item` links until it reaches an item
/// without one. Missing keys and dangling parent links resolve to
/// `Ok(None)`, which callers treat as an expected outcome, not a failure.
///
/// The walk is bounded. Revisiting a key, or following more than
/// `max_depth` links, fails with [`EngineError::ParentCycle`]; a malformed
/// graph must never hang the caller.
pub fn resolve_top_level<'a, G: ItemGraph>(
    graph: &'a G,
    key: &str,
    max_depth: usize,
) -> EngineResult<Option<&'a Item>> {
    let Some(mut current) = graph.item(key) else {
        return Ok(None);
    };

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(current.key.as_str());

    let mut hops = 0;
    while let Some(parent_key) = current.data.parent_item.as_deref() {
        hops += 1;
        if hops > max_depth || !visited.insert(parent_key) {
            return Err(EngineError::ParentCycle {
                key: key.to_string(),
                depth: hops,
            });
        }

        match graph.item(parent_key) {
            Some(parent) => current = parent,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}
