//! Transport-ready payloads.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::collector::CollectedItem;

/// Fallback content type for eligible candidates that lack one.
const OCTET_STREAM: &str = "application/octet-stream";

/// Reversible text encodings for payload content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// Standard base64 with padding.
    #[default]
    Base64,
    /// Lowercase hex.
    Hex,
}

impl PayloadEncoding {
    /// Returns the serialized name of this encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadEncoding::Base64 => "base64",
            PayloadEncoding::Hex => "hex",
        }
    }

    /// Encodes raw bytes into this encoding.
    pub fn encode(&self, data: &[u8]) -> String {
        match self {
            PayloadEncoding::Base64 => STANDARD.encode(data),
            PayloadEncoding::Hex => hex::encode(data),
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport-ready attachment payload.
///
/// The engine's sole output contract: filename and content type describe
/// the original attachment, `content` carries its verified bytes in the
/// stated encoding. Payloads are plain values; once produced they are
/// never revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Attachment filename.
    pub filename: String,
    /// MIME type of the original content.
    pub content_type: String,
    /// Attachment bytes in the payload encoding.
    pub content: String,
    /// The encoding applied to `content`.
    pub encoding: PayloadEncoding,
}

impl Payload {
    /// Builds the payload for a collected item.
    ///
    /// Filename and content type come from the selected attachment, with
    /// the attachment key and `application/octet-stream` as fallbacks.
    /// The verified bytes are re-encoded with `encoding`.
    pub fn from_collected(collected: &CollectedItem, encoding: PayloadEncoding) -> Self {
        let attachment = &collected.attachment;
        Self {
            filename: attachment
                .data
                .filename
                .clone()
                .unwrap_or_else(|| attachment.key.clone()),
            content_type: attachment
                .data
                .content_type
                .clone()
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            content: encoding.encode(&collected.data),
            encoding,
        }
    }
}
