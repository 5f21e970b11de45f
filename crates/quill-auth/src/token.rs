//! Certificate-bound bearer tokens.
//!
//! Wire format: `base64(certDER) "." base64(signature)`, where the
//! signature covers `base64(body) "." base64(certDER)`. The certificate is
//! the claims: verification yields the authenticated identity without any
//! server-side session state.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quill_csp::{CryptoProvider, HashOpts, Key, KeyImportOpts, SignatureOpts};
use x509_cert::Certificate;

use crate::cert::{classify_public_key, parse_certificate, CertPublicKey};
use crate::error::{Error, Result};

/// Payload the signature covers, in creation order.
fn signed_payload(body: &[u8], cert_der: &[u8]) -> String {
    format!("{}.{}", STANDARD.encode(body), STANDARD.encode(cert_der))
}

/// Build a token binding `body` to the certificate and its private key.
///
/// Only ECDSA certificate keys are supported; any other key type is an
/// explicit error rather than a silently unsigned token.
pub fn create_token(
    csp: &dyn CryptoProvider,
    cert_der: &[u8],
    key: &dyn Key,
    body: &[u8],
) -> Result<String> {
    let certificate = parse_certificate(cert_der)?;
    match classify_public_key(&certificate) {
        CertPublicKey::Ecdsa => {}
        other => return Err(Error::UnsupportedKeyType(other.to_string())),
    }

    let payload = signed_payload(body, cert_der);
    let digest = csp.hash(payload.as_bytes(), &HashOpts::ProviderDefault)?;
    let signature = csp.sign(key, &digest, &SignatureOpts::default())?;
    if signature.is_empty() {
        return Err(Error::Crypto("provider produced an empty signature".to_string()));
    }

    Ok(format!(
        "{}.{}",
        STANDARD.encode(cert_der),
        STANDARD.encode(signature)
    ))
}

/// Verify a token against the exact body bytes it was created for.
///
/// Returns the parsed certificate as the authenticated identity. A
/// signature that does not validate for `body` is [`Error::Verification`];
/// structural problems with the token itself are [`Error::Format`].
pub fn verify_token(
    csp: &dyn CryptoProvider,
    token: &str,
    body: &[u8],
) -> Result<Certificate> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Format(format!(
            "token must have exactly two segments, found {}",
            parts.len()
        )));
    }

    let cert_der = STANDARD
        .decode(parts[0])
        .map_err(|e| Error::Format(format!("certificate segment is not valid base64: {e}")))?;
    let signature = STANDARD
        .decode(parts[1])
        .map_err(|e| Error::Format(format!("signature segment is not valid base64: {e}")))?;

    let certificate = parse_certificate(&cert_der)?;

    // Identical construction order to create_token
    let payload = signed_payload(body, &cert_der);
    let digest = csp.hash(payload.as_bytes(), &HashOpts::ProviderDefault)?;

    let public_key = csp.key_import(&cert_der, &KeyImportOpts::certificate())?;
    match csp.verify(public_key.as_ref(), &signature, &digest, &SignatureOpts::default()) {
        Ok(true) => Ok(certificate),
        Ok(false) => Err(Error::Verification),
        Err(e) => {
            tracing::debug!(error = %e, "token signature verification errored");
            Err(Error::Verification)
        }
    }
}
