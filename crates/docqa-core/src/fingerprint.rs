//! Content fingerprints for uploaded documents.
//!
//! A [`ContentFingerprint`] is the lowercase hex SHA-256 digest of the raw
//! upload bytes. Every chunk of a document carries it, and together with the
//! chunk index it forms the chunk's storage key, so re-ingesting identical
//! bytes overwrites instead of duplicating.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Lowercase hex SHA-256 digest; only [`fingerprint`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint raw document bytes.
///
/// Fails with [`Error::InvalidInput`] for an empty payload.
pub fn fingerprint(bytes: &[u8]) -> Result<ContentFingerprint> {
    if bytes.is_empty() {
        return Err(Error::invalid_input("file bytes cannot be empty"));
    }
    let digest = Sha256::digest(bytes);
    Ok(ContentFingerprint(hex::encode(digest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_rejected() {
        assert!(matches!(fingerprint(b""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn known_digest() {
        let fp = fingerprint(b"abc").unwrap();
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn identical_bytes_identical_fingerprint() {
        let bytes = b"The quick brown fox".to_vec();
        assert_eq!(fingerprint(&bytes).unwrap(), fingerprint(&bytes.clone()).unwrap());
    }

    #[test]
    fn single_bit_flip_changes_fingerprint() {
        let original = b"The quick brown fox".to_vec();
        let mut flipped = original.clone();
        flipped[4] ^= 0b0000_0001;
        assert_ne!(fingerprint(&original).unwrap(), fingerprint(&flipped).unwrap());
    }
}
