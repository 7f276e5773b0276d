//! Sink Registry
//!
//! Stores sinks for fan-out delivery. Every registered sink receives every
//! delivery; a failing sink never stops delivery to the others.
//!
//! # Invariants
//!
//! - Order is preserved (first registered = first delivered to)
//! - Failures and panics are logged and counted, never returned to the caller

use super::Sink;
use crate::error::{panic_message, PluginError};
use eventrouter_core::EventRecord;
use futures::FutureExt;
use prometheus::IntCounterVec;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registry for sinks
///
/// Populated at startup and then used read-only by the router.
///
/// # Example
///
/// ```ignore
/// use eventrouter::sink::{SinkRegistry, StdoutSink};
///
/// let mut sinks = SinkRegistry::new();
/// sinks.add(Arc::new(StdoutSink::new()));
/// ```
pub struct SinkRegistry {
    sinks: Vec<Arc<dyn Sink>>,
    failures: Option<IntCounterVec>,
}

impl SinkRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            failures: None,
        }
    }

    /// Add a sink to the registry
    pub fn add(&mut self, sink: Arc<dyn Sink>) {
        info!(sink = sink.name(), "Registered sink");
        self.sinks.push(sink);
    }

    /// Builder-style [`add`](Self::add)
    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.add(sink);
        self
    }

    /// Count failed deliveries in `counter`, labelled by sink name
    pub fn set_failure_counter(&mut self, counter: IntCounterVec) {
        self.failures = Some(counter);
    }

    /// Get all sinks
    pub fn all(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }

    /// Get the number of registered sinks
    pub fn count(&self) -> usize {
        self.sinks.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver one observation to every sink
    ///
    /// Returns the number of sinks that accepted it.
    pub async fn deliver_to_all(&self, event: &EventRecord, old: Option<&EventRecord>) -> usize {
        if self.sinks.is_empty() {
            warn!(event = %event.key(), "No sinks registered, event will be dropped");
            return 0;
        }

        let mut success_count = 0;

        for sink in &self.sinks {
            let outcome = AssertUnwindSafe(sink.deliver(event, old))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {
                    debug!(sink = sink.name(), event = %event.key(), "Event delivered");
                    success_count += 1;
                }
                Ok(Err(e)) => {
                    error!(
                        sink = sink.name(),
                        event = %event.key(),
                        error = %e,
                        "Failed to deliver event"
                    );
                    self.record_failure(sink.name());
                }
                Err(panic) => {
                    error!(
                        sink = sink.name(),
                        event = %event.key(),
                        panic = panic_message(panic.as_ref()),
                        "Sink panicked during delivery"
                    );
                    self.record_failure(sink.name());
                }
            }
        }

        success_count
    }

    fn record_failure(&self, sink: &str) {
        if let Some(failures) = &self.failures {
            failures.with_label_values(&[sink]).inc();
        }
    }

    /// Check health of all sinks
    pub async fn health(&self) -> HashMap<String, bool> {
        let mut health = HashMap::new();

        for sink in &self.sinks {
            health.insert(sink.name().to_string(), sink.health().await);
        }

        health
    }

    /// Graceful shutdown of all sinks
    pub async fn shutdown(&self) -> Result<(), PluginError> {
        info!("Shutting down {} sinks", self.sinks.len());

        for sink in &self.sinks {
            if let Err(e) = sink.shutdown().await {
                error!(sink = sink.name(), error = %e, "Error during sink shutdown");
            }
        }

        Ok(())
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use prometheus::Opts;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // ==========================================================================
    // Mock Sink for testing
    // ==========================================================================

    struct MockSink {
        name: &'static str,
        fail: bool,
        shutdown_called: AtomicBool,
        delivered: AtomicUsize,
    }

    impl MockSink {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                fail: false,
                shutdown_called: AtomicBool::new(false),
                delivered: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::named(name)
            }
        }

        fn delivered(&self) -> usize {
            self.delivered.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Sink for MockSink {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn deliver(
            &self,
            _event: &EventRecord,
            _old: Option<&EventRecord>,
        ) -> Result<(), PluginError> {
            if self.fail {
                return Err(PluginError::Send("intentional failure".into()));
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn health(&self) -> bool {
            !self.fail
        }

        async fn shutdown(&self) -> Result<(), PluginError> {
            self.shutdown_called.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickingSink;

    #[async_trait::async_trait]
    impl Sink for PanickingSink {
        fn name(&self) -> &'static str {
            "boom"
        }

        async fn deliver(
            &self,
            _event: &EventRecord,
            _old: Option<&EventRecord>,
        ) -> Result<(), PluginError> {
            panic!("sink exploded");
        }
    }

    fn record() -> EventRecord {
        EventRecord::new("ns1", "p1.evt").with_type("Normal")
    }

    // ==========================================================================
    // Registration tests
    // ==========================================================================

    #[test]
    fn new_registry_has_no_sinks() {
        let registry = SinkRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn add_sink_appends_to_list() {
        let registry = SinkRegistry::new()
            .with(Arc::new(MockSink::named("first")))
            .with(Arc::new(MockSink::named("second")));

        let names: Vec<_> = registry.all().iter().map(|s| s.name()).collect();
        assert_eq!(names, &["first", "second"]);
    }

    // ==========================================================================
    // Delivery tests
    // ==========================================================================

    #[tokio::test]
    async fn deliver_fans_out_to_all_sinks() {
        let a = Arc::new(MockSink::named("a"));
        let b = Arc::new(MockSink::named("b"));
        let registry = SinkRegistry::new().with(a.clone()).with(b.clone());

        let success = registry.deliver_to_all(&record(), None).await;

        assert_eq!(success, 2);
        assert_eq!(a.delivered(), 1);
        assert_eq!(b.delivered(), 1);
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_others() {
        let good = Arc::new(MockSink::named("good"));
        let failures = IntCounterVec::new(Opts::new("failures", "failures"), &["sink"]).unwrap();

        let mut registry = SinkRegistry::new()
            .with(Arc::new(MockSink::failing("bad")))
            .with(good.clone());
        registry.set_failure_counter(failures.clone());

        let success = registry.deliver_to_all(&record(), None).await;

        assert_eq!(success, 1);
        assert_eq!(good.delivered(), 1);
        assert_eq!(failures.with_label_values(&["bad"]).get(), 1);
        assert_eq!(failures.with_label_values(&["good"]).get(), 0);
    }

    #[tokio::test]
    async fn panicking_sink_does_not_starve_later_sinks() {
        let good = Arc::new(MockSink::named("good"));
        let failures = IntCounterVec::new(Opts::new("failures", "failures"), &["sink"]).unwrap();

        let mut registry = SinkRegistry::new()
            .with(Arc::new(PanickingSink))
            .with(good.clone());
        registry.set_failure_counter(failures.clone());

        for _ in 0..3 {
            assert_eq!(registry.deliver_to_all(&record(), None).await, 1);
        }

        assert_eq!(good.delivered(), 3);
        assert_eq!(failures.with_label_values(&["boom"]).get(), 3);
        assert_eq!(failures.with_label_values(&["good"]).get(), 0);
    }

    #[tokio::test]
    async fn deliver_with_no_sinks_returns_zero() {
        let registry = SinkRegistry::new();
        assert_eq!(registry.deliver_to_all(&record(), None).await, 0);
    }

    // ==========================================================================
    // Health / shutdown tests
    // ==========================================================================

    #[tokio::test]
    async fn health_reports_each_sink() {
        let registry = SinkRegistry::new()
            .with(Arc::new(MockSink::named("up")))
            .with(Arc::new(MockSink::failing("down")));

        let health = registry.health().await;
        assert_eq!(health.get("up"), Some(&true));
        assert_eq!(health.get("down"), Some(&false));
    }

    #[tokio::test]
    async fn shutdown_calls_every_sink() {
        let a = Arc::new(MockSink::named("a"));
        let b = Arc::new(MockSink::named("b"));
        let registry = SinkRegistry::new().with(a.clone()).with(b.clone());

        registry.shutdown().await.unwrap();

        assert!(a.shutdown_called.load(Ordering::SeqCst));
        assert!(b.shutdown_called.load(Ordering::SeqCst));
    }
}
