//! # Quill Auth
//!
//! Certificate-bound bearer tokens over a [`quill_csp::CryptoProvider`].
//!
//! A token is `base64(certDER) "." base64(signature)`: the certificate is
//! the claims, the signature binds it to the exact request body, and
//! verification needs no server-side session state.

pub mod cert;
pub mod error;
pub mod signer;
pub mod token;

// Re-export core functionality
pub use cert::{classify_public_key, parse_certificate, CertPublicKey};
pub use error::{Error, Result};
pub use signer::CertificateSigner;
pub use token::{create_token, verify_token};
