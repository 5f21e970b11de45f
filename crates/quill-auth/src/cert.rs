//! X.509 certificate parsing helpers for the token protocol.

use std::path::Path;

use const_oid::ObjectIdentifier;
use x509_cert::{
    der::{Decode, DecodePem, Encode},
    Certificate,
};

use crate::error::{Error, Result};

/// Kind of public key a certificate binds.
///
/// Resolved once at parse time; token signing dispatches on this instead of
/// inspecting the key again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertPublicKey {
    /// Elliptic-curve key (id-ecPublicKey)
    Ecdsa,
    /// RSA key (rsaEncryption)
    Rsa,
    /// Anything else, carrying the algorithm OID
    Other(ObjectIdentifier),
}

impl std::fmt::Display for CertPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertPublicKey::Ecdsa => write!(f, "ECDSA"),
            CertPublicKey::Rsa => write!(f, "RSA"),
            CertPublicKey::Other(oid) => write!(f, "OID {oid}"),
        }
    }
}

/// Parse a DER-encoded X.509 certificate.
pub fn parse_certificate(der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der)
        .map_err(|e| Error::Format(format!("Failed to parse certificate: {e}")))
}

/// Classify the subject public key of a parsed certificate.
pub fn classify_public_key(cert: &Certificate) -> CertPublicKey {
    let oid = cert.tbs_certificate.subject_public_key_info.algorithm.oid;
    if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
        CertPublicKey::Ecdsa
    } else if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
        CertPublicKey::Rsa
    } else {
        CertPublicKey::Other(oid)
    }
}

/// Re-encode the certificate's SubjectPublicKeyInfo as DER.
pub fn certificate_spki_der(cert: &Certificate) -> Result<Vec<u8>> {
    cert.tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("Failed to encode SPKI: {e}")))
}

/// Read a PEM certificate file and return its DER encoding.
pub fn read_certificate_pem_file(path: &Path) -> Result<Vec<u8>> {
    let pem = std::fs::read_to_string(path)?;
    let cert = Certificate::from_pem(pem.as_bytes())
        .map_err(|e| Error::Certificate(format!("Failed to parse {}: {e}", path.display())))?;
    cert.to_der()
        .map_err(|e| Error::Certificate(format!("Failed to re-encode certificate: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_garbage_is_format_error() {
        assert!(matches!(
            parse_certificate(b"not a certificate"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_classify_ecdsa_certificate() {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
        let params = rcgen::CertificateParams::new(vec!["test.quill".to_string()]).unwrap();
        let cert = params.self_signed(&key_pair).unwrap();

        let parsed = parse_certificate(cert.der()).unwrap();
        assert_eq!(classify_public_key(&parsed), CertPublicKey::Ecdsa);
        assert!(!certificate_spki_der(&parsed).unwrap().is_empty());
    }

    #[test]
    fn test_missing_certificate_file() {
        let err = read_certificate_pem_file(Path::new("/nonexistent/cert.pem")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
