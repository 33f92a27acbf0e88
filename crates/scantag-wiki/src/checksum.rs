//! Content checksums for edit submissions

use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of `data`
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
