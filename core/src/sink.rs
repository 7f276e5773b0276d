//! Sink trait for eventrouter destinations
//!
//! The [`Sink`] trait is the output side of the router: every substantive
//! add or update is handed to the configured sinks.

use crate::error::PluginError;
use crate::record::EventRecord;
use async_trait::async_trait;

/// Sink trait - delivers event records to a destination
///
/// Multiple sinks can be registered with the router and every substantive
/// observation is delivered to all of them.
///
/// # Implementation Requirements
///
/// - Sinks must be `Send + Sync`; callbacks may run on several tasks at once
/// - `deliver` must not hold on to the borrowed records after it returns
/// - Delivery results are logged by the router and never retried
///
/// # Example
///
/// ```ignore
/// use eventrouter_core::{EventRecord, PluginError, Sink};
/// use async_trait::async_trait;
///
/// struct CountingSink(std::sync::atomic::AtomicU64);
///
/// #[async_trait]
/// impl Sink for CountingSink {
///     fn name(&self) -> &'static str {
///         "counting"
///     }
///
///     async fn deliver(
///         &self,
///         _event: &EventRecord,
///         _old: Option<&EventRecord>,
///     ) -> Result<(), PluginError> {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name for identification and logging, e.g. "stdout"
    fn name(&self) -> &'static str;

    /// Deliver one observation
    ///
    /// # Arguments
    ///
    /// * `event` - The current snapshot
    /// * `old` - The previous snapshot for updates, `None` for adds
    async fn deliver(
        &self,
        event: &EventRecord,
        old: Option<&EventRecord>,
    ) -> Result<(), PluginError>;

    /// Check whether the destination is accepting deliveries
    ///
    /// The default implementation always reports healthy.
    async fn health(&self) -> bool {
        true
    }

    /// Graceful shutdown
    ///
    /// Flush buffered output and release resources. The default
    /// implementation returns `Ok(())` for sinks that need no cleanup.
    async fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
