use thiserror::Error;

/// Errors produced by the token codec and signer adapter.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed token: wrong separator count, bad base64, unparsable DER
    #[error("Format error: {0}")]
    Format(String),

    /// Certificate could not be read or parsed
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// Certificate binds a key type the token protocol does not sign with
    #[error("Unsupported certificate key type: {0}")]
    UnsupportedKeyType(String),

    /// Signature present but does not validate for the supplied body
    #[error("Token verification failed")]
    Verification,

    /// 签名相关错误
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Error from the underlying crypto provider
    #[error("CSP error: {0}")]
    Csp(#[from] quill_csp::Error),

    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result类型别名
pub type Result<T> = std::result::Result<T, Error>;
