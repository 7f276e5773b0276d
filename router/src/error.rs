//! Error types for the router

use std::any::Any;
use thiserror::Error;

pub use eventrouter_core::PluginError;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, RouterError>;

/// Main error type for the router
#[derive(Error, Debug)]
pub enum RouterError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The informer never reported its initial list as complete
    #[error("timed out waiting for caches to sync")]
    CacheSync,

    /// Metrics registration or lookup error
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl From<prometheus::Error> for RouterError {
    fn from(err: prometheus::Error) -> Self {
        RouterError::Metrics(err.to_string())
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
