//! # Quill
//!
//! Pluggable cryptographic service providers and a certificate-bound
//! bearer-token protocol built on top of them.
//!
//! ## Crates
//!
//! - `quill_csp` - provider abstraction, keys, software keystore, factory
//! - `quill_auth` - auth token codec and certificate signer adapter

// Re-export all sub-crates
pub use quill_auth;
pub use quill_csp;
