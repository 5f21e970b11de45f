//! Provider factory: configuration resolution, the constructor registry and
//! the process-wide default provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::provider::CryptoProvider;
use crate::software::SoftwareProvider;

/// Name of the built-in software backend
pub const SOFTWARE_PROVIDER: &str = "software";
/// Name of the dynamically-loaded backend
pub const PLUGIN_PROVIDER: &str = "plugin";

const DEFAULT_HASH_FAMILY: &str = "SHA2";
const DEFAULT_SECURITY_LEVEL: u32 = 256;
const DEFAULT_KEYSTORE_DIR: &str = "keystore";

// ============================================================================
// Configuration
// ============================================================================

/// Raw provider configuration, typically deserialized from a config file.
///
/// All fields are optional; [`ProviderConfig::resolve`] fills defaults and
/// makes relative paths absolute against a home directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name; defaults to the software backend
    pub provider: Option<String>,
    /// Software backend hash family (`SHA2` or `SHA3`)
    pub hash_family: Option<String>,
    /// Software backend security level (256 or 384)
    pub security_level: Option<u32>,
    /// Software backend keystore root
    pub keystore_path: Option<PathBuf>,
    /// Plugin backend shared-library path
    pub library: Option<PathBuf>,
    /// Opaque configuration handed to a plugin constructor
    pub plugin_config: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Fill defaults and absolutize paths against `home`.
    pub fn resolve(&self, home: &Path) -> Result<ResolvedConfig> {
        let absolutize = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                home.join(path)
            }
        };

        let keystore_path = self
            .keystore_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_KEYSTORE_DIR));

        Ok(ResolvedConfig {
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| SOFTWARE_PROVIDER.to_string()),
            hash_family: self
                .hash_family
                .clone()
                .unwrap_or_else(|| DEFAULT_HASH_FAMILY.to_string()),
            security_level: self.security_level.unwrap_or(DEFAULT_SECURITY_LEVEL),
            keystore_path: absolutize(keystore_path),
            library: self.library.as_deref().map(absolutize),
            plugin_config: self.plugin_config.clone().unwrap_or_default(),
        })
    }
}

/// Configuration with defaults filled and all paths absolute.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: String,
    pub hash_family: String,
    pub security_level: u32,
    pub keystore_path: PathBuf,
    pub library: Option<PathBuf>,
    pub plugin_config: HashMap<String, String>,
}

// ============================================================================
// Constructor Registry
// ============================================================================

/// Constructor signature for registered backends
pub type ProviderCtor = fn(&ResolvedConfig) -> Result<Arc<dyn CryptoProvider>>;

fn registry() -> &'static RwLock<HashMap<String, ProviderCtor>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, ProviderCtor>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut ctors: HashMap<String, ProviderCtor> = HashMap::new();
        ctors.insert(SOFTWARE_PROVIDER.to_string(), SoftwareProvider::construct);
        RwLock::new(ctors)
    })
}

/// Register a statically linked backend under a provider name.
///
/// Hardware-module backends hook in here; a later registration under the
/// same name replaces the earlier one.
pub fn register_provider(name: &str, ctor: ProviderCtor) -> Result<()> {
    let mut ctors = registry()
        .write()
        .map_err(|_| Error::Config("provider registry lock poisoned".to_string()))?;
    ctors.insert(name.to_string(), ctor);
    Ok(())
}

/// Resolve a configuration to a provider instance.
///
/// Dispatches by provider name: `plugin` goes through the dynamic loader,
/// everything else through the registry. Unknown names are a configuration
/// error.
pub fn provider_for(config: &ResolvedConfig) -> Result<Arc<dyn CryptoProvider>> {
    if config.provider == PLUGIN_PROVIDER {
        let library = crate::plugin::validate_plugin_config(config)?;

        #[cfg(feature = "plugin")]
        {
            return crate::plugin::load_plugin_provider(library, &config.plugin_config);
        }

        #[cfg(not(feature = "plugin"))]
        {
            let _ = library;
            return Err(Error::Config(
                "plugin providers require the `plugin` feature".to_string(),
            ));
        }
    }

    let ctors = registry()
        .read()
        .map_err(|_| Error::Config("provider registry lock poisoned".to_string()))?;
    let ctor = ctors
        .get(&config.provider)
        .ok_or_else(|| Error::Config(format!("unknown provider: {}", config.provider)))?;

    tracing::debug!(provider = %config.provider, "constructing crypto provider");
    ctor(config)
}

/// Resolve an optional raw configuration to a provider instance.
///
/// An absent configuration is a configuration error, raised before any
/// other activity.
pub fn provider_from(config: Option<&ProviderConfig>, home: &Path) -> Result<Arc<dyn CryptoProvider>> {
    let config =
        config.ok_or_else(|| Error::Config("provider configuration is required".to_string()))?;
    provider_for(&config.resolve(home)?)
}

// ============================================================================
// Default Provider Singleton
// ============================================================================

static DEFAULT_PROVIDER: OnceLock<Arc<dyn CryptoProvider>> = OnceLock::new();

/// Initialize the process-wide default provider from an explicit
/// configuration. Fails if a default has already been installed.
///
/// Call this once during startup; afterwards [`default_provider`] returns
/// the same instance to every caller.
pub fn init_default_provider(config: &ProviderConfig, home: &Path) -> Result<()> {
    let provider = provider_for(&config.resolve(home)?)?;
    DEFAULT_PROVIDER
        .set(provider)
        .map_err(|_| Error::Config("default provider already initialized".to_string()))
}

/// The process-wide default provider.
///
/// Constructed exactly once; concurrent first-time callers all observe the
/// same completed instance. Without a prior [`init_default_provider`] call
/// the software backend is built from defaults under the current directory.
///
/// # Panics
///
/// Default-provider construction failure leaves no cryptographic operation
/// able to proceed, so it is treated as fatal rather than retried.
pub fn default_provider() -> &'static Arc<dyn CryptoProvider> {
    DEFAULT_PROVIDER.get_or_init(|| {
        let home = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let resolved = ProviderConfig::default()
            .resolve(&home)
            .expect("default provider configuration is invalid");
        provider_for(&resolved).expect("default crypto provider initialization failed")
    })
}

// ============================================================================
// Tests
// ============================================================================
