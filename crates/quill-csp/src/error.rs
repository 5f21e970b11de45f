use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by cryptographic service providers and the factory.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested algorithm/size pair is not in the supported set
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No key with the given SKI in the provider's keystore
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Plugin library path does not name an existing file
    #[error("Plugin library not found: {}", .0.display())]
    PluginNotFound(PathBuf),

    /// Plugin failed to load, or a required symbol is missing or incompatible
    #[error("Plugin load error: {0}")]
    PluginLoad(String),

    /// Malformed key material (bad PEM/DER, unparsable certificate)
    #[error("Format error: {0}")]
    Format(String),

    /// Hash/sign operation failure, or malformed signature input
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Private key material cannot be exported
    #[error("Key is not exportable")]
    NonExportable,

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
