// All imports
use std::any::Any;
use std::sync::Arc;

use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::Pkcs1v15Sign;
use sha2::{Sha256, Sha384};

use super::Key;
use crate::error::{Error, Result};
use crate::hash::{digest, HashAlgorithm};

/// Select the PKCS#1 v1.5 padding scheme from the digest length.
///
/// `sign`/`verify` operate on pre-computed digests, so the hash that
/// produced the digest is recovered from its length (32 = SHA-256,
/// 48 = SHA-384). Other lengths are malformed input.
fn padding_for_digest(digest: &[u8]) -> Result<Pkcs1v15Sign> {
    match digest.len() {
        32 => Ok(Pkcs1v15Sign::new::<Sha256>()),
        48 => Ok(Pkcs1v15Sign::new::<Sha384>()),
        n => Err(Error::Crypto(format!(
            "unsupported digest length for RSA signing: {n}"
        ))),
    }
}

// ============================================================================
// Private Key
// ============================================================================

/// RSA private key (2048, 3072 or 4096 bits)
pub struct RsaPrivateKey {
    inner: rsa::RsaPrivateKey,
    ski: Vec<u8>,
}

impl RsaPrivateKey {
    /// Generate a new RSA key of the given size.
    ///
    /// Sizes outside {2048, 3072, 4096} are rejected, never rounded.
    pub fn generate(bits: u32) -> Result<Self> {
        if !matches!(bits, 2048 | 3072 | 4096) {
            return Err(Error::UnsupportedAlgorithm(format!("RSA-{bits}")));
        }
        let inner = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), bits as usize)
            .map_err(|e| Error::Crypto(format!("RSA-{bits} generation failed: {e}")))?;
        Self::from_inner(inner)
    }

    /// Import from PKCS#8 DER
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let inner = rsa::RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::Format(format!("RSA PKCS#8 import failed: {e}")))?;
        Self::from_inner(inner)
    }

    /// Import from PKCS#8 PEM
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self> {
        let inner = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| Error::Format(format!("RSA PKCS#8 import failed: {e}")))?;
        Self::from_inner(inner)
    }

    fn from_inner(inner: rsa::RsaPrivateKey) -> Result<Self> {
        let spki_der = inner
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| Error::Crypto(format!("RSA SPKI encoding failed: {e}")))?
            .into_vec();
        let ski = digest(HashAlgorithm::Sha256, &spki_der);
        Ok(Self { inner, ski })
    }

    /// Export as PKCS#8 PEM for keystore persistence
    pub(crate) fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = self
            .inner
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#8 export failed: {e}")))?;
        Ok(pem.to_string())
    }

    /// Sign a pre-computed digest with PKCS#1 v1.5 padding
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let padding = padding_for_digest(digest)?;
        self.inner
            .sign_with_rng(&mut rand::thread_rng(), padding, digest)
            .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))
    }

    /// The matching public key handle
    pub fn public_half(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::from_inner(self.inner.to_public_key())
    }
}

impl Key for RsaPrivateKey {
    fn ski(&self) -> &[u8] {
        &self.ski
    }

    fn is_private(&self) -> bool {
        true
    }

    fn bytes(&self) -> Result<Vec<u8>> {
        Err(Error::NonExportable)
    }

    fn public_key(&self) -> Result<Arc<dyn Key>> {
        Ok(Arc::new(self.public_half()?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Public Key
// ============================================================================

/// RSA public key
#[derive(Clone)]
pub struct RsaPublicKey {
    inner: rsa::RsaPublicKey,
    spki_der: Vec<u8>,
    ski: Vec<u8>,
}

impl RsaPublicKey {
    /// Import from SubjectPublicKeyInfo DER
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let inner = rsa::RsaPublicKey::from_public_key_der(der)
            .map_err(|e| Error::Format(format!("RSA SPKI import failed: {e}")))?;
        Self::from_inner(inner)
    }

    fn from_inner(inner: rsa::RsaPublicKey) -> Result<Self> {
        let spki_der = inner
            .to_public_key_der()
            .map_err(|e| Error::Crypto(format!("RSA SPKI encoding failed: {e}")))?
            .into_vec();
        let ski = digest(HashAlgorithm::Sha256, &spki_der);
        Ok(Self {
            inner,
            spki_der,
            ski,
        })
    }

    /// SubjectPublicKeyInfo DER encoding
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Export as SPKI PEM for keystore persistence
    pub(crate) fn to_spki_pem(&self) -> Result<String> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::Crypto(format!("RSA SPKI export failed: {e}")))
    }

    /// Verify a PKCS#1 v1.5 signature over a pre-computed digest
    pub fn verify_digest(&self, digest: &[u8], signature: &[u8]) -> Result<bool> {
        let padding = padding_for_digest(digest)?;
        Ok(self.inner.verify(padding, digest, signature).is_ok())
    }
}

impl Key for RsaPublicKey {
    fn ski(&self) -> &[u8] {
        &self.ski
    }

    fn is_private(&self) -> bool {
        false
    }

    fn bytes(&self) -> Result<Vec<u8>> {
        Ok(self.spki_der.clone())
    }

    fn public_key(&self) -> Result<Arc<dyn Key>> {
        Ok(Arc::new(self.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_rejects_unsupported_sizes() {
        assert!(matches!(
            RsaPrivateKey::generate(1024),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            RsaPrivateKey::generate(512),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let key = RsaPrivateKey::generate(2048).unwrap();
        let dgst = digest(HashAlgorithm::Sha256, b"rsa message");

        let sig = key.sign_digest(&dgst).unwrap();
        let public = key.public_half().unwrap();
        assert!(public.verify_digest(&dgst, &sig).unwrap());

        let other = digest(HashAlgorithm::Sha256, b"tampered");
        assert!(!public.verify_digest(&other, &sig).unwrap());
    }

    #[test]
    fn test_sha384_digest_selects_matching_padding() {
        let key = RsaPrivateKey::generate(2048).unwrap();
        let dgst = digest(HashAlgorithm::Sha384, b"rsa message");

        let sig = key.sign_digest(&dgst).unwrap();
        assert!(key.public_half().unwrap().verify_digest(&dgst, &sig).unwrap());
    }

    #[test]
    fn test_odd_digest_length_is_crypto_error() {
        let key = RsaPrivateKey::generate(2048).unwrap();
        assert!(matches!(
            key.sign_digest(&[0u8; 20]),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_ski_stable_across_import() {
        let key = RsaPrivateKey::generate(2048).unwrap();
        let public = key.public_half().unwrap();
        assert_eq!(key.ski(), public.ski());

        let reimported = RsaPublicKey::from_spki_der(public.spki_der()).unwrap();
        assert_eq!(public.ski(), reimported.ski());
    }
}
