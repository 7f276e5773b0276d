//! Error types for eventrouter sinks

use thiserror::Error;

/// Error type for sink operations
///
/// Returned by [`Sink`](crate::Sink) implementations. The controller never
/// acts on these; they exist so sink registries can log and count failures
/// with a structured category.
///
/// # Example
///
/// ```
/// use eventrouter_core::PluginError;
///
/// fn write_line() -> Result<(), PluginError> {
///     Err(PluginError::Send("broken pipe".to_string()))
/// }
///
/// match write_line() {
///     Ok(_) => println!("written"),
///     Err(PluginError::Send(msg)) => println!("send failed: {}", msg),
///     Err(e) => println!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// Encoding failed
    ///
    /// Returned when a record cannot be rendered into the sink's wire format.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Send failed
    ///
    /// Examples: broken pipe on stdout, remote endpoint rejected the payload.
    #[error("send failed: {0}")]
    Send(String),

    /// Shutdown error
    ///
    /// Examples: failed to flush buffered output.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
