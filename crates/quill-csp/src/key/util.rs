use std::convert::TryFrom;
use std::sync::Arc;

use const_oid::ObjectIdentifier;
use pkcs8::{
    der::pem::PemLabel,
    spki::{der::asn1::AnyRef, SubjectPublicKeyInfoRef},
    Document, PrivateKeyInfo, SecretDocument,
};
use x509_cert::{
    der::{Decode, Encode},
    Certificate,
};

use super::{EcdsaCurve, EcdsaPrivateKey, EcdsaPublicKey, Key, RsaPrivateKey, RsaPublicKey};
use crate::error::{Error, Result};

/// 从 PKCS#8 / SPKI 算法标识符识别出的密钥算法。
enum DetectedAlgorithm {
    EcdsaP256,
    EcdsaP384,
    Rsa,
}

fn classify(oid: ObjectIdentifier, parameters: Option<AnyRef<'_>>) -> Result<DetectedAlgorithm> {
    if oid == const_oid::db::rfc5912::RSA_ENCRYPTION {
        return Ok(DetectedAlgorithm::Rsa);
    }

    if oid == const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
        let Some(params) = parameters else {
            return Err(Error::Format("EC key is missing curve parameters".to_string()));
        };
        let curve_oid = ObjectIdentifier::try_from(params)
            .map_err(|e| Error::Format(format!("Failed to parse curve OID: {e}")))?;
        if curve_oid == const_oid::db::rfc5912::SECP_256_R_1 {
            return Ok(DetectedAlgorithm::EcdsaP256);
        }
        if curve_oid == const_oid::db::rfc5912::SECP_384_R_1 {
            return Ok(DetectedAlgorithm::EcdsaP384);
        }
        return Err(Error::UnsupportedAlgorithm(format!(
            "EC curve OID {curve_oid}"
        )));
    }

    Err(Error::UnsupportedAlgorithm(format!("key algorithm OID {oid}")))
}

// ============================================================================
// Private key material
// ============================================================================

/// Load a private key from PKCS#8 DER, detecting the algorithm from its OID.
pub fn private_key_from_pkcs8_der(der: &[u8]) -> Result<Arc<dyn Key>> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| Error::Format(format!("Failed to parse PKCS#8: {e}")))?;

    match classify(info.algorithm.oid, info.algorithm.parameters)? {
        DetectedAlgorithm::EcdsaP256 => Ok(Arc::new(EcdsaPrivateKey::from_pkcs8_der(
            EcdsaCurve::P256,
            der,
        )?)),
        DetectedAlgorithm::EcdsaP384 => Ok(Arc::new(EcdsaPrivateKey::from_pkcs8_der(
            EcdsaCurve::P384,
            der,
        )?)),
        DetectedAlgorithm::Rsa => Ok(Arc::new(RsaPrivateKey::from_pkcs8_der(der)?)),
    }
}

/// Load a private key from PKCS#8 PEM, detecting the algorithm from its OID.
pub fn private_key_from_pkcs8_pem(pem: &str) -> Result<Arc<dyn Key>> {
    let (label, doc) = SecretDocument::from_pem(pem)
        .map_err(|e| Error::Format(format!("Failed to decode PEM: {e}")))?;

    if label != PrivateKeyInfo::PEM_LABEL {
        return Err(Error::Format(format!("Invalid PKCS#8 label: {label}")));
    }

    private_key_from_pkcs8_der(doc.as_bytes())
}

// ============================================================================
// Public key material
// ============================================================================

/// Load a public key from SubjectPublicKeyInfo DER.
pub fn public_key_from_spki_der(der: &[u8]) -> Result<Arc<dyn Key>> {
    let spki = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| Error::Format(format!("Failed to parse SPKI: {e}")))?;

    match classify(spki.algorithm.oid, spki.algorithm.parameters)? {
        DetectedAlgorithm::EcdsaP256 => Ok(Arc::new(EcdsaPublicKey::from_spki_der(
            EcdsaCurve::P256,
            der,
        )?)),
        DetectedAlgorithm::EcdsaP384 => Ok(Arc::new(EcdsaPublicKey::from_spki_der(
            EcdsaCurve::P384,
            der,
        )?)),
        DetectedAlgorithm::Rsa => Ok(Arc::new(RsaPublicKey::from_spki_der(der)?)),
    }
}

/// Load a public key from SubjectPublicKeyInfo PEM.
pub fn public_key_from_spki_pem(pem: &str) -> Result<Arc<dyn Key>> {
    let (label, doc) = Document::from_pem(pem)
        .map_err(|e| Error::Format(format!("Failed to decode PEM: {e}")))?;

    if label != SubjectPublicKeyInfoRef::PEM_LABEL {
        return Err(Error::Format(format!("Invalid SPKI label: {label}")));
    }

    public_key_from_spki_der(doc.as_bytes())
}

/// Import the subject public key of a DER-encoded X.509 certificate.
///
/// Yields the same SKI as importing the bare SPKI of the same key.
pub fn public_key_from_certificate_der(der: &[u8]) -> Result<Arc<dyn Key>> {
    let cert = Certificate::from_der(der)
        .map_err(|e| Error::Format(format!("Failed to parse certificate: {e}")))?;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Format(format!("Failed to encode certificate SPKI: {e}")))?;

    public_key_from_spki_der(&spki_der)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_private_algorithms() {
        let ec = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        let pem = ec.to_pkcs8_pem().unwrap();
        let loaded = private_key_from_pkcs8_pem(&pem).unwrap();
        assert_eq!(loaded.ski(), ec.ski());
        assert!(loaded.is_private());

        let ec384 = EcdsaPrivateKey::generate(EcdsaCurve::P384).unwrap();
        let loaded = private_key_from_pkcs8_pem(&ec384.to_pkcs8_pem().unwrap()).unwrap();
        assert_eq!(loaded.ski(), ec384.ski());
    }

    #[test]
    fn test_detect_public_algorithms() {
        let ec = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        let public = ec.public_half().unwrap();
        let loaded = public_key_from_spki_der(public.spki_der()).unwrap();
        assert_eq!(loaded.ski(), public.ski());
        assert!(!loaded.is_private());
    }

    #[test]
    fn test_bad_pem_label_rejected() {
        let ec = EcdsaPrivateKey::generate(EcdsaCurve::P256).unwrap();
        let pem = ec.public_half().unwrap().to_spki_pem().unwrap();
        // A public key PEM is not a PKCS#8 private key
        assert!(matches!(
            private_key_from_pkcs8_pem(&pem),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_garbage_der_rejected() {
        assert!(matches!(
            private_key_from_pkcs8_der(b"garbage"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            public_key_from_spki_der(b"garbage"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            public_key_from_certificate_der(b"garbage"),
            Err(Error::Format(_))
        ));
    }
}
