//! Error types for the collection engine.

use std::fmt;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while collecting or delivering attachments.
///
/// During batch collection these are absorbed per key; they only surface
/// directly from single-item operations and from delivery.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The attachment store failed to produce content.
    #[error("fetch failed for attachment {key}: {message}")]
    Fetch {
        /// Key of the attachment being fetched.
        key: String,
        /// Store-reported failure message.
        message: String,
    },

    /// The fetched attachment content was empty.
    #[error("attachment {key} has no content")]
    EmptyAttachment {
        /// Key of the empty attachment.
        key: String,
    },

    /// The fetched content does not match the declared checksum.
    #[error("checksum mismatch for attachment {key}: declared {declared}, computed {computed}")]
    ChecksumMismatch {
        /// Key of the attachment that failed verification.
        key: String,
        /// Digest declared by the item metadata.
        declared: String,
        /// Digest computed from the fetched bytes.
        computed: String,
    },

    /// The attachment declares no checksum, so content cannot be verified.
    #[error("attachment {key} declares no checksum")]
    MissingChecksum {
        /// Key of the unverifiable attachment.
        key: String,
    },

    /// A parent chain did not reach a top-level item within bounds.
    #[error("parent chain for {key} loops or exceeds {depth} links")]
    ParentCycle {
        /// The key whose resolution was abandoned.
        key: String,
        /// Number of parent links followed before giving up.
        depth: usize,
    },

    /// The recipient address is not a plausible email address.
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),

    /// The delivery collaborator failed to send a payload.
    #[error("delivery failed for {filename}: {message}")]
    Delivery {
        /// Filename of the payload being delivered.
        filename: String,
        /// Collaborator-reported failure message.
        message: String,
    },
}

impl EngineError {
    /// Creates a fetch error for the given attachment key.
    pub fn fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Fetch {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a delivery error for the given payload filename.
    pub fn delivery(filename: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Delivery {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error means the content is corrupt or
    /// unverifiable rather than merely unavailable.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::ChecksumMismatch { .. } | EngineError::MissingChecksum { .. }
        )
    }
}

/// Why a key produced no payload without being an error.
///
/// Skips are ordinary outcomes of batch collection; they are counted and
/// logged but never abort anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The key, or a link in its parent chain, had no item in the graph.
    Missing,
    /// The resolved item was already collected in this batch.
    Duplicate,
    /// The resolved item has no children to select from.
    NoChildren,
    /// No child passed the attachment selection filters.
    NoCandidate,
}

impl SkipReason {
    /// Returns a short name for this skip reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Missing => "missing",
            SkipReason::Duplicate => "duplicate",
            SkipReason::NoChildren => "no_children",
            SkipReason::NoCandidate => "no_candidate",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_key() {
        let error = EngineError::fetch("ATTACH01", "connection reset");
        assert_eq!(
            error.to_string(),
            "fetch failed for attachment ATTACH01: connection reset"
        );

        let error = EngineError::ChecksumMismatch {
            key: "ATTACH01".to_string(),
            declared: "aaaa".to_string(),
            computed: "bbbb".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "checksum mismatch for attachment ATTACH01: declared aaaa, computed bbbb"
        );
    }

    #[test]
    fn integrity_predicate_covers_verification_failures() {
        let mismatch = EngineError::ChecksumMismatch {
            key: "A".to_string(),
            declared: "aaaa".to_string(),
            computed: "bbbb".to_string(),
        };
        let missing = EngineError::MissingChecksum {
            key: "A".to_string(),
        };
        let fetch = EngineError::fetch("A", "offline");

        assert!(mismatch.is_integrity());
        assert!(missing.is_integrity());
        assert!(!fetch.is_integrity());
    }

    #[test]
    fn skip_reasons_have_stable_names() {
        assert_eq!(SkipReason::Missing.as_str(), "missing");
        assert_eq!(SkipReason::Duplicate.as_str(), "duplicate");
        assert_eq!(SkipReason::NoChildren.as_str(), "no_children");
        assert_eq!(SkipReason::NoCandidate.to_string(), "no_candidate");
    }
}
