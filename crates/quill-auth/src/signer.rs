//! Signer adapter binding a certificate and its provider-held private key.

use std::path::Path;
use std::sync::Arc;

use quill_csp::{CryptoProvider, HashOpts, ImportFormat, Key, KeyImportOpts, SignatureOpts};
use x509_cert::Certificate;

use crate::cert::{parse_certificate, read_certificate_pem_file};
use crate::error::{Error, Result};
use crate::token::create_token;

/// Generic signer usable by transport layers: a parsed certificate plus the
/// matching private key, bound to the provider that holds it.
#[derive(Debug)]
pub struct CertificateSigner {
    cert_der: Vec<u8>,
    certificate: Certificate,
    key: Arc<dyn Key>,
    provider: Arc<dyn CryptoProvider>,
}

impl CertificateSigner {
    /// Build a signer for a certificate whose private key is enrolled in the
    /// provider's keystore.
    ///
    /// The certificate's public key is imported (ephemerally) to recover its
    /// SKI, and the private key is looked up under that identifier.
    pub fn from_certificate(
        cert_der: &[u8],
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        let certificate = parse_certificate(cert_der)?;
        let public_key = provider.key_import(cert_der, &KeyImportOpts::certificate())?;
        let key = provider.get_key(public_key.ski())?;
        if !key.is_private() {
            // The lookup resolved to the public half we just imported; the
            // private key was never enrolled
            return Err(Error::Csp(quill_csp::Error::KeyNotFound(hex::encode(
                public_key.ski(),
            ))));
        }

        Ok(Self {
            cert_der: cert_der.to_vec(),
            certificate,
            key,
            provider,
        })
    }

    /// Build a signer from a certificate file, falling back to a raw
    /// private-key file when the key was never enrolled.
    ///
    /// Certificate problems always propagate; the fallback only engages on a
    /// keystore miss, and the key it imports stays ephemeral.
    pub fn from_files(
        cert_path: &Path,
        key_path: &Path,
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        let cert_der = read_certificate_pem_file(cert_path)?;

        match Self::from_certificate(&cert_der, Arc::clone(&provider)) {
            Ok(signer) => Ok(signer),
            Err(Error::Csp(quill_csp::Error::KeyNotFound(_))) => {
                tracing::debug!(
                    key_file = %key_path.display(),
                    "private key not enrolled, importing from key file"
                );
                let pem = std::fs::read(key_path)?;
                let key = provider.key_import(
                    &pem,
                    &KeyImportOpts::new(ImportFormat::Pkcs8PrivatePem, true),
                )?;
                let certificate = parse_certificate(&cert_der)?;
                Ok(Self {
                    cert_der,
                    certificate,
                    key,
                    provider,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Hash `message` with the provider default and sign the digest.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = self.provider.hash(message, &HashOpts::ProviderDefault)?;
        let signature = self
            .provider
            .sign(self.key.as_ref(), &digest, &SignatureOpts::default())?;
        Ok(signature)
    }

    /// Produce an auth token binding `body` to this signer's certificate.
    pub fn auth_token(&self, body: &[u8]) -> Result<String> {
        create_token(
            self.provider.as_ref(),
            &self.cert_der,
            self.key.as_ref(),
            body,
        )
    }

    /// The parsed certificate
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// DER encoding of the certificate
    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    /// SKI of the bound private key
    pub fn ski(&self) -> &[u8] {
        self.key.ski()
    }
}
