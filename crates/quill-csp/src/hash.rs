//! Digest computation for the provider `hash` operation.
//!
//! The software provider fixes its default algorithm from the configured
//! hash family (SHA2/SHA3) and security level (256/384).

use sha2::{Digest, Sha256, Sha384};
use sha3::{Sha3_256, Sha3_384};

use crate::error::{Error, Result};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Default)]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte output)
    #[default]
    Sha256,
    /// SHA-384 (48-byte output)
    Sha384,
    /// SHA3-256 (32-byte output)
    Sha3_256,
    /// SHA3-384 (48-byte output)
    Sha3_384,
}

impl HashAlgorithm {
    /// Map a (family, security level) configuration pair to an algorithm.
    ///
    /// Unknown pairs are a configuration error, never rounded to a default.
    pub fn from_family(family: &str, level: u32) -> Result<Self> {
        match (family.to_ascii_uppercase().as_str(), level) {
            ("SHA2", 256) => Ok(HashAlgorithm::Sha256),
            ("SHA2", 384) => Ok(HashAlgorithm::Sha384),
            ("SHA3", 256) => Ok(HashAlgorithm::Sha3_256),
            ("SHA3", 384) => Ok(HashAlgorithm::Sha3_384),
            _ => Err(Error::Config(format!(
                "unsupported hash family/security level: {family}-{level}"
            ))),
        }
    }

    /// Digest output length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 => 48,
        }
    }
}

/// Compute the digest of `data` using the specified algorithm
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha3_256 => Sha3_256::digest(data).to_vec(),
        HashAlgorithm::Sha3_384 => Sha3_384::digest(data).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        let data = b"quill hash test";
        assert_eq!(digest(HashAlgorithm::Sha256, data).len(), 32);
        assert_eq!(digest(HashAlgorithm::Sha384, data).len(), 48);
        assert_eq!(digest(HashAlgorithm::Sha3_256, data).len(), 32);
        assert_eq!(digest(HashAlgorithm::Sha3_384, data).len(), 48);
    }

    #[test]
    fn test_digest_deterministic() {
        let data = b"same input";
        assert_eq!(
            digest(HashAlgorithm::Sha256, data),
            digest(HashAlgorithm::Sha256, data)
        );
        // SHA2 and SHA3 must not collide on the same input
        assert_ne!(
            digest(HashAlgorithm::Sha256, data),
            digest(HashAlgorithm::Sha3_256, data)
        );
    }

    #[test]
    fn test_from_family() {
        assert_eq!(
            HashAlgorithm::from_family("SHA2", 256).unwrap(),
            HashAlgorithm::Sha256
        );
        assert_eq!(
            HashAlgorithm::from_family("sha3", 384).unwrap(),
            HashAlgorithm::Sha3_384
        );
        assert!(HashAlgorithm::from_family("SHA2", 512).is_err());
        assert!(HashAlgorithm::from_family("MD5", 128).is_err());
    }
}
