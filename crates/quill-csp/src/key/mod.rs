//! Key handles owned by a cryptographic service provider.
//!
//! A [`Key`] is an opaque handle: callers address it by SKI and hand it back
//! to the provider that produced it for signing or verification. Private key
//! material never leaves the provider through this trait.

mod ecdsa;
mod rsa;
pub(crate) mod util;

use std::any::Any;
use std::sync::Arc;

pub use ecdsa::{EcdsaCurve, EcdsaPrivateKey, EcdsaPublicKey};
pub use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::Result;

/// Opaque handle to key material held by a provider.
///
/// The SKI (subject key identifier) is the SHA-256 digest of the key's
/// SubjectPublicKeyInfo DER encoding. It is stable across repeated imports
/// of the same public material and is the only supported lookup handle.
pub trait Key: Send + Sync {
    /// Subject key identifier
    fn ski(&self) -> &[u8];

    /// True for private (signing-capable) keys
    fn is_private(&self) -> bool;

    /// True for symmetric keys; none of the supported key types are symmetric
    fn is_symmetric(&self) -> bool {
        false
    }

    /// Raw export of the key material.
    ///
    /// Public keys return their SPKI DER; private keys refuse with
    /// [`crate::Error::NonExportable`].
    fn bytes(&self) -> Result<Vec<u8>>;

    /// The public half of this key; identity for public keys
    fn public_key(&self) -> Result<Arc<dyn Key>>;

    /// Downcast support for providers dispatching on the concrete type
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("ski", &self.ski())
            .field("is_private", &self.is_private())
            .finish()
    }
}
