//! Conversion backends: the component that actually maps text between scripts.
//!
//! The engine only orchestrates. Two interchangeable strategies exist:
//! an in-process library call ([`EmbeddedConversion`]) and an HTTP round trip
//! to a local conversion service ([`RemoteServiceConversion`]).

mod embedded;
mod remote;

pub use embedded::EmbeddedConversion;
#[cfg(test)]
pub(crate) use remote::stub;
pub use remote::{
    RemoteServiceConversion, ServiceHealth, ServiceScripts, DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT,
};

use crate::cache::CacheKey;

/// How quickly a backend produces results, which decides whether the engine
/// can answer a miss inline or must defer to its background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Cheap, in-process call. Misses are converted on the caller's thread.
    Immediate,
    /// Out-of-process call. Misses return a placeholder and fill later.
    Deferred,
}

/// One conversion, addressed by registry identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

impl From<&CacheKey> for ConversionRequest {
    fn from(key: &CacheKey) -> Self {
        Self {
            text: key.text.clone(),
            source: key.source.clone(),
            target: key.target.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("unsupported script: {0}")]
    UnsupportedScript(String),
    #[error("conversion panicked: {0}")]
    Panicked(String),
}

pub trait ConversionBackend: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    fn resolution(&self) -> Resolution;

    /// Convert `request.text` from `request.source` to `request.target`.
    ///
    /// Errors are reported, never swallowed here; the engine decides how to
    /// degrade.
    fn convert(&self, request: &ConversionRequest) -> Result<String, BackendError>;
}
