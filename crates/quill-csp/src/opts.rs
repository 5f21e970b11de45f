//! Operation options: key generation, key import, hashing, signing.

use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;

// ============================================================================
// Key Generation
// ============================================================================

/// Key generation request, one variant per supported (algorithm, size) pair.
///
/// The set is closed: unsupported sizes (RSA-1024, ECDSA-521, ...) are
/// rejected by [`KeyGenOpts::for_algorithm`], never rounded to a neighbor.
/// `ephemeral` keys must not be persisted to durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenOpts {
    /// NIST P-256 ECDSA key
    EcdsaP256 { ephemeral: bool },
    /// NIST P-384 ECDSA key
    EcdsaP384 { ephemeral: bool },
    /// RSA 2048-bit key
    Rsa2048 { ephemeral: bool },
    /// RSA 3072-bit key
    Rsa3072 { ephemeral: bool },
    /// RSA 4096-bit key
    Rsa4096 { ephemeral: bool },
}

impl KeyGenOpts {
    /// Map a requested algorithm family and bit size to exactly one variant.
    ///
    /// With no request, the default is ECDSA P-256.
    pub fn for_algorithm(request: Option<(&str, u32)>, ephemeral: bool) -> Result<Self> {
        let Some((family, bits)) = request else {
            return Ok(KeyGenOpts::EcdsaP256 { ephemeral });
        };

        match (family.to_ascii_uppercase().as_str(), bits) {
            ("ECDSA", 256) => Ok(KeyGenOpts::EcdsaP256 { ephemeral }),
            ("ECDSA", 384) => Ok(KeyGenOpts::EcdsaP384 { ephemeral }),
            ("RSA", 2048) => Ok(KeyGenOpts::Rsa2048 { ephemeral }),
            ("RSA", 3072) => Ok(KeyGenOpts::Rsa3072 { ephemeral }),
            ("RSA", 4096) => Ok(KeyGenOpts::Rsa4096 { ephemeral }),
            _ => Err(Error::UnsupportedAlgorithm(format!("{family}-{bits}"))),
        }
    }

    /// Whether the generated key must stay out of durable storage
    pub fn ephemeral(&self) -> bool {
        match *self {
            KeyGenOpts::EcdsaP256 { ephemeral }
            | KeyGenOpts::EcdsaP384 { ephemeral }
            | KeyGenOpts::Rsa2048 { ephemeral }
            | KeyGenOpts::Rsa3072 { ephemeral }
            | KeyGenOpts::Rsa4096 { ephemeral } => ephemeral,
        }
    }
}

// ============================================================================
// Key Import
// ============================================================================

/// Encoding of key material handed to `key_import`.
///
/// The key algorithm is not part of the format: it is detected from the
/// PKCS#8 / SPKI algorithm identifier of the material itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// PKCS#8 DER private key
    Pkcs8PrivateDer,
    /// PKCS#8 PEM private key
    Pkcs8PrivatePem,
    /// SubjectPublicKeyInfo DER public key
    SpkiPublicDer,
    /// SubjectPublicKeyInfo PEM public key
    SpkiPublicPem,
    /// DER-encoded X.509 certificate; the subject public key is imported
    CertificatePublicKey,
}

/// Options for `key_import`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyImportOpts {
    pub format: ImportFormat,
    /// Imported key stays out of durable storage
    pub ephemeral: bool,
}

impl KeyImportOpts {
    pub fn new(format: ImportFormat, ephemeral: bool) -> Self {
        Self { format, ephemeral }
    }

    /// Ephemeral import of a certificate's subject public key
    pub fn certificate() -> Self {
        Self::new(ImportFormat::CertificatePublicKey, true)
    }
}

// ============================================================================
// Hashing and Signing
// ============================================================================

/// Hash algorithm selection for the `hash` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashOpts {
    /// Use the provider's configured default algorithm
    #[default]
    ProviderDefault,
    Sha256,
    Sha384,
    Sha3_256,
    Sha3_384,
}

impl HashOpts {
    /// Resolve against the provider default
    pub fn resolve(&self, provider_default: HashAlgorithm) -> HashAlgorithm {
        match self {
            HashOpts::ProviderDefault => provider_default,
            HashOpts::Sha256 => HashAlgorithm::Sha256,
            HashOpts::Sha384 => HashAlgorithm::Sha384,
            HashOpts::Sha3_256 => HashAlgorithm::Sha3_256,
            HashOpts::Sha3_384 => HashAlgorithm::Sha3_384,
        }
    }
}

/// Options for `sign`/`verify`.
///
/// The signature scheme follows the key type; for RSA the PKCS#1 v1.5
/// digest prefix is selected from the digest length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureOpts {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_algorithm_default() {
        let opts = KeyGenOpts::for_algorithm(None, false).unwrap();
        assert_eq!(opts, KeyGenOpts::EcdsaP256 { ephemeral: false });
    }

    #[test]
    fn test_for_algorithm_known_pairs() {
        assert_eq!(
            KeyGenOpts::for_algorithm(Some(("ecdsa", 384)), true).unwrap(),
            KeyGenOpts::EcdsaP384 { ephemeral: true }
        );
        assert_eq!(
            KeyGenOpts::for_algorithm(Some(("RSA", 3072)), false).unwrap(),
            KeyGenOpts::Rsa3072 { ephemeral: false }
        );
    }

    #[test]
    fn test_for_algorithm_rejects_unknown_sizes() {
        // No silent rounding to a supported neighbor
        assert!(matches!(
            KeyGenOpts::for_algorithm(Some(("ECDSA", 521)), false),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            KeyGenOpts::for_algorithm(Some(("RSA", 1024)), false),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            KeyGenOpts::for_algorithm(Some(("ED25519", 256)), false),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
