//! Hashing utilities for evaluation records.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of data and returns hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes SHA-256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_hex(s.as_bytes())
}

/// Prefixes a digest so fingerprints are recognisable in logs.
pub fn fingerprint(canonical: &str) -> String {
    format!("ev:{}", sha256_str(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let hash = sha256_str("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_fingerprint_prefix() {
        let fp = fingerprint("{}");
        assert!(fp.starts_with("ev:"));
        assert_eq!(fp, fingerprint("{}"));
        assert_ne!(fp, fingerprint("[]"));
    }
}
