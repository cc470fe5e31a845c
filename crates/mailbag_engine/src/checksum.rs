//! Content digest helpers.

use md5::{Digest, Md5};

/// Computes the MD5 digest of `data` as lowercase hex.
///
/// MD5 is the digest the originating libraries declare on attachment
/// items; it is used here for integrity gating, not security.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
