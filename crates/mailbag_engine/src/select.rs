//! Attachment candidate selection.

use mailbag_session::{Item, LinkMode};

/// Selects the best sendable attachment from `children`.
///
/// A candidate must be an attachment item whose content was imported into
/// the library (`imported_file`) and whose MIME type appears in
/// `allowed_types`. Among eligible candidates the most recently added
/// wins; the incumbent is displaced only by a strictly later `dateAdded`,
/// so on equal dates the first-seen candidate keeps precedence. Undated
/// candidates sort below dated ones.
///
/// Returns `None` when no child passes the filters.
pub fn select_attachment<'a>(children: &'a [Item], allowed_types: &[String]) -> Option<&'a Item> {
    let mut best: Option<&Item> = None;

    for next in children {
        if !next.is_attachment() {
            continue;
        }
        if next.data.link_mode != Some(LinkMode::ImportedFile) {
            continue;
        }
        let Some(content_type) = next.data.content_type.as_deref() else {
            continue;
        };
        if !allowed_types.iter().any(|m| m == content_type) {
            continue;
        }

        if let Some(current) = best {
            // Incumbent keeps ties; only a strictly later date displaces it.
            if next.data.date_added <= current.data.date_added {
                continue;
            }
        }

        best = Some(next);
    }

    best
}
