//! Operational Prometheus metrics for the router
//!
//! These describe the router itself (callbacks seen, replays suppressed,
//! resets performed, sink failures) and live in the same registry as the
//! event counters so one scrape returns both.

use crate::error::{Result, RouterError};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Router self-metrics
#[derive(Clone)]
pub struct RouterMetrics {
    /// Callbacks received from the informer (by callback)
    pub callbacks: IntCounterVec,

    /// Update callbacks suppressed as resync replays
    pub updates_suppressed: IntCounter,

    /// Counter resets performed
    pub counter_resets: IntCounter,

    /// Failed deliveries (by sink)
    pub sink_failures: IntCounterVec,
}

impl RouterMetrics {
    /// Create and register the metrics in `registry`
    pub fn register(registry: &Registry) -> Result<Self> {
        let callbacks = IntCounterVec::new(
            Opts::new(
                "eventrouter_callbacks_total",
                "Informer callbacks received by the router",
            ),
            &["callback"],
        )
        .map_err(|e| RouterError::Metrics(format!("callbacks: {e}")))?;

        let updates_suppressed = IntCounter::new(
            "eventrouter_updates_suppressed_total",
            "Update callbacks suppressed as resync replays",
        )
        .map_err(|e| RouterError::Metrics(format!("updates_suppressed: {e}")))?;

        let counter_resets = IntCounter::new(
            "eventrouter_counter_resets_total",
            "Times the event counters were reset",
        )
        .map_err(|e| RouterError::Metrics(format!("counter_resets: {e}")))?;

        let sink_failures = IntCounterVec::new(
            Opts::new(
                "eventrouter_sink_failures_total",
                "Deliveries a sink reported as failed",
            ),
            &["sink"],
        )
        .map_err(|e| RouterError::Metrics(format!("sink_failures: {e}")))?;

        registry.register(Box::new(callbacks.clone()))?;
        registry.register(Box::new(updates_suppressed.clone()))?;
        registry.register(Box::new(counter_resets.clone()))?;
        registry.register(Box::new(sink_failures.clone()))?;

        Ok(Self {
            callbacks,
            updates_suppressed,
            counter_resets,
            sink_failures,
        })
    }

    /// Record one informer callback
    pub fn record_callback(&self, callback: &str) {
        self.callbacks.with_label_values(&[callback]).inc();
    }

    /// Record a suppressed resync replay
    pub fn record_suppressed(&self) {
        self.updates_suppressed.inc();
    }

    /// Record a counter reset
    pub fn record_reset(&self) {
        self.counter_resets.inc();
    }

    /// Record a failed delivery
    pub fn record_sink_failure(&self, sink: &str) {
        self.sink_failures.with_label_values(&[sink]).inc();
    }
}
