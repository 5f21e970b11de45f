use std::sync::Arc;

use crate::error::Result;
use crate::key::Key;
use crate::opts::{HashOpts, KeyGenOpts, KeyImportOpts, SignatureOpts};

/// Capability set of a cryptographic service provider.
///
/// All operations are safe to invoke concurrently from multiple callers;
/// providers serialize their own keystore mutations internally. Keys are
/// returned as shared handles so a provider may hand out its cached
/// instances.
pub trait CryptoProvider: Send + Sync {
    /// Generate a new key per the options.
    ///
    /// Ephemeral keys must not touch durable storage.
    fn key_gen(&self, opts: &KeyGenOpts) -> Result<Arc<dyn Key>>;

    /// Import key material.
    ///
    /// Importing the same public material twice (raw SPKI or via an X.509
    /// certificate) yields an identical SKI.
    fn key_import(&self, raw: &[u8], opts: &KeyImportOpts) -> Result<Arc<dyn Key>>;

    /// Look up a previously generated or imported key by SKI.
    fn get_key(&self, ski: &[u8]) -> Result<Arc<dyn Key>>;

    /// Compute a digest; the algorithm defaults to the provider configuration.
    fn hash(&self, msg: &[u8], opts: &HashOpts) -> Result<Vec<u8>>;

    /// Sign a pre-computed digest. Fails if `key` is not a private key.
    fn sign(&self, key: &dyn Key, digest: &[u8], opts: &SignatureOpts) -> Result<Vec<u8>>;

    /// Verify a signature over a pre-computed digest.
    ///
    /// A signature that does not match is `Ok(false)`, not an error;
    /// malformed inputs are an error.
    fn verify(
        &self,
        key: &dyn Key,
        signature: &[u8],
        digest: &[u8],
        opts: &SignatureOpts,
    ) -> Result<bool>;
}

impl std::fmt::Debug for dyn CryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoProvider").finish_non_exhaustive()
    }
}
