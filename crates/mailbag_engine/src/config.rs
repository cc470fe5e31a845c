//! Configuration for the collection engine.

use serde::Deserialize;

use crate::payload::PayloadEncoding;

/// MIME types eligible for selection when nothing else is configured.
const DEFAULT_MIMETYPES: &[&str] = &["application/pdf"];

/// Bound on parent-chain resolution. Real libraries nest one or two
/// levels deep; anything past this is a malformed graph.
const DEFAULT_MAX_PARENT_DEPTH: usize = 32;

/// Configuration for attachment collection.
///
/// Values are fixed at collector construction; nothing is re-read
/// mid-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// MIME types an attachment must carry to be selected.
    pub mimetypes: Vec<String>,
    /// Maximum number of parent links to follow during resolution.
    pub max_parent_depth: usize,
    /// Text encoding applied to payload content.
    pub encoding: PayloadEncoding,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            mimetypes: DEFAULT_MIMETYPES.iter().map(|m| (*m).to_string()).collect(),
            max_parent_depth: DEFAULT_MAX_PARENT_DEPTH,
            encoding: PayloadEncoding::Base64,
        }
    }
}

impl CollectorConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the MIME allow list.
    pub fn with_mimetypes<I, S>(mut self, mimetypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mimetypes = mimetypes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the resolution depth bound.
    pub fn with_max_parent_depth(mut self, depth: usize) -> Self {
        self.max_parent_depth = depth;
        self
    }

    /// Sets the payload encoding.
    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns true if the given content type is eligible for selection.
    pub fn allows(&self, content_type: &str) -> bool {
        self.mimetypes.iter().any(|m| m == content_type)
    }

    /// Builds a configuration from layered overrides.
    ///
    /// Defaults apply first, then the `file` tier, then call-site
    /// `options`. Later tiers override field-wise: a tier that leaves a
    /// field unset keeps whatever the tier below decided.
    pub fn layered(file: Option<ConfigOverlay>, options: Option<ConfigOverlay>) -> Self {
        let mut config = Self::default();
        for overlay in [file, options].into_iter().flatten() {
            config.apply(overlay);
        }
        config
    }

    fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(mimetypes) = overlay.mimetypes {
            self.mimetypes = mimetypes;
        }
        if let Some(depth) = overlay.max_parent_depth {
            self.max_parent_depth = depth;
        }
        if let Some(encoding) = overlay.encoding {
            self.encoding = encoding;
        }
    }
}

/// One partial configuration tier, e.g. a config-file section or the
/// options a caller passes alongside a request.
///
/// Every field is optional; an absent field leaves the lower tier
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverlay {
    /// Overrides the MIME allow list.
    pub mimetypes: Option<Vec<String>>,
    /// Overrides the resolution depth bound.
    pub max_parent_depth: Option<usize>,
    /// Overrides the payload encoding.
    pub encoding: Option<PayloadEncoding>,
}
