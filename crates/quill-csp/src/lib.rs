//! # Quill CSP
//!
//! Pluggable cryptographic service provider abstraction.
//!
//! A [`CryptoProvider`] owns keys and exposes a narrow capability set:
//! key generation, import, SKI lookup, hashing, signing and verification.
//! The built-in [`SoftwareProvider`] backs keys with a file keystore;
//! further backends register by name through the [`factory`], or load
//! dynamically behind the `plugin` feature.

pub mod error;
pub mod factory;
pub mod hash;
pub mod key;
pub mod opts;
pub mod plugin;
pub mod provider;
pub mod software;

// Re-export core functionality
pub use error::{Error, Result};
pub use factory::{
    default_provider, init_default_provider, provider_for, provider_from, register_provider,
    ProviderConfig, ProviderCtor, ResolvedConfig, PLUGIN_PROVIDER, SOFTWARE_PROVIDER,
};
pub use hash::HashAlgorithm;
pub use key::{EcdsaCurve, EcdsaPrivateKey, EcdsaPublicKey, Key, RsaPrivateKey, RsaPublicKey};
pub use opts::{HashOpts, ImportFormat, KeyGenOpts, KeyImportOpts, SignatureOpts};
pub use provider::CryptoProvider;
pub use software::SoftwareProvider;
