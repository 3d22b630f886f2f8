//! SHA-256 content checksums
//!
//! A single canonical checksum format (`sha256:<hex>`) is used for drift
//! detection between passes. The checksum is always computed over the exact
//! bytes written to the vault, after any marker injection.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of note content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_has_prefix() {
        assert!(content_checksum("hello world").starts_with("sha256:"));
    }

    #[test]
    fn checksum_is_deterministic() {
        assert_eq!(content_checksum("note"), content_checksum("note"));
    }

    #[test]
    fn different_content_different_checksum() {
        assert_ne!(content_checksum("aaa"), content_checksum("bbb"));
    }

    #[test]
    fn checksum_known_value() {
        assert_eq!(
            content_checksum("hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
