//! Dynamically loaded provider backends.
//!
//! An external shared library exports two symbols: an API-version function
//! and a constructor. The loader checks the version before invoking the
//! constructor, and keeps the library handle alive for as long as the
//! provider it produced.
//!
//! Configuration validation is always compiled; the loader itself requires
//! the `plugin` cargo feature.

use std::path::Path;

use crate::error::{Error, Result};
use crate::factory::ResolvedConfig;

/// Version of the plugin contract this build understands
pub const PLUGIN_API_VERSION: u32 = 1;

/// Exported symbol returning the plugin's API version
pub const SYMBOL_API_VERSION: &str = "quill_provider_api_version";

/// Exported constructor symbol
pub const SYMBOL_NEW: &str = "quill_provider_new";

/// Type of the `quill_provider_api_version` export
pub type ProviderApiVersionFn = unsafe extern "C" fn() -> u32;

/// Type of the `quill_provider_new` export.
///
/// The constructor receives the plugin-specific configuration mapping and
/// returns a provider or an error; the factory returns its result
/// unmodified.
pub type ProviderNewFn = fn(
    &std::collections::HashMap<String, String>,
) -> std::result::Result<Box<dyn crate::provider::CryptoProvider>, Error>;

/// Check the plugin section of a resolved configuration.
///
/// A missing `library` path is a configuration error, raised before any
/// filesystem or loader activity; a path that does not name an existing
/// file is a not-found error.
pub(crate) fn validate_plugin_config(config: &ResolvedConfig) -> Result<&Path> {
    let library = config
        .library
        .as_deref()
        .ok_or_else(|| Error::Config("plugin provider requires a library path".to_string()))?;

    if !library.is_file() {
        return Err(Error::PluginNotFound(library.to_path_buf()));
    }

    Ok(library)
}

#[cfg(feature = "plugin")]
mod loader {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use libloading::{Library, Symbol};

    use super::{ProviderApiVersionFn, ProviderNewFn, PLUGIN_API_VERSION, SYMBOL_API_VERSION, SYMBOL_NEW};
    use crate::error::{Error, Result};
    use crate::key::Key;
    use crate::opts::{HashOpts, KeyGenOpts, KeyImportOpts, SignatureOpts};
    use crate::provider::CryptoProvider;

    /// Provider loaded from a shared library.
    ///
    /// The library handle must outlive the boxed provider it constructed;
    /// field order keeps the provider dropping first.
    struct PluginProvider {
        inner: Box<dyn CryptoProvider>,
        _library: Library,
    }

    impl CryptoProvider for PluginProvider {
        fn key_gen(&self, opts: &KeyGenOpts) -> Result<Arc<dyn Key>> {
            self.inner.key_gen(opts)
        }

        fn key_import(&self, raw: &[u8], opts: &KeyImportOpts) -> Result<Arc<dyn Key>> {
            self.inner.key_import(raw, opts)
        }

        fn get_key(&self, ski: &[u8]) -> Result<Arc<dyn Key>> {
            self.inner.get_key(ski)
        }

        fn hash(&self, msg: &[u8], opts: &HashOpts) -> Result<Vec<u8>> {
            self.inner.hash(msg, opts)
        }

        fn sign(&self, key: &dyn Key, digest: &[u8], opts: &SignatureOpts) -> Result<Vec<u8>> {
            self.inner.sign(key, digest, opts)
        }

        fn verify(
            &self,
            key: &dyn Key,
            signature: &[u8],
            digest: &[u8],
            opts: &SignatureOpts,
        ) -> Result<bool> {
            self.inner.verify(key, signature, digest, opts)
        }
    }

    /// Load a provider from a shared library already validated to exist.
    pub(crate) fn load_plugin_provider(
        library_path: &Path,
        plugin_config: &HashMap<String, String>,
    ) -> Result<Arc<dyn CryptoProvider>> {
        let library = unsafe { Library::new(library_path) }.map_err(|e| {
            Error::PluginLoad(format!(
                "failed to load {}: {e}",
                library_path.display()
            ))
        })?;

        let provider = {
            let api_version: Symbol<ProviderApiVersionFn> =
                unsafe { library.get(SYMBOL_API_VERSION.as_bytes()) }.map_err(|_| {
                    Error::PluginLoad(format!("missing required symbol: {SYMBOL_API_VERSION}"))
                })?;

            let found = unsafe { api_version() };
            if found != PLUGIN_API_VERSION {
                return Err(Error::PluginLoad(format!(
                    "incompatible plugin API version: expected {PLUGIN_API_VERSION}, found {found}"
                )));
            }

            let ctor: Symbol<ProviderNewFn> = unsafe { library.get(SYMBOL_NEW.as_bytes()) }
                .map_err(|_| Error::PluginLoad(format!("missing required symbol: {SYMBOL_NEW}")))?;

            tracing::info!(library = %library_path.display(), "loaded provider plugin");
            ctor(plugin_config)?
        };

        Ok(Arc::new(PluginProvider {
            inner: provider,
            _library: library,
        }))
    }
}

#[cfg(feature = "plugin")]
pub(crate) use loader::load_plugin_provider;
