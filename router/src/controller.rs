//! Router controller
//!
//! Receives informer callbacks and drives the rest of the pipeline:
//!
//! ```text
//! on_add ───────────────────────────────┐
//!                                       ├─► Classifier ─► CounterRegistry
//! on_update ─► DedupFilter ──Forward────┤
//!                  │                    └─► SinkRegistry ─► sinks
//!                  └─Suppressed─► ResetScheduler
//! on_delete ─► debug log
//! ```
//!
//! The controller spawns nothing. [`Router::run`] only gates startup on the
//! informer's initial sync and then waits for the stop signal.

use crate::counters::{Classifier, CounterRegistry};
use crate::dedup::{DedupFilter, UpdateVerdict};
use crate::error::{panic_message, Result, RouterError};
use crate::informer::{wait_for_cache_sync, EventHandler, HasSynced};
use crate::metrics::RouterMetrics;
use crate::reset::ResetScheduler;
use crate::sink::SinkRegistry;
use async_trait::async_trait;
use eventrouter_core::EventRecord;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Default bound on the initial cache sync
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Counts and forwards cluster events
pub struct Router {
    counters: Arc<CounterRegistry>,
    classifier: Classifier,
    dedup: DedupFilter,
    resets: ResetScheduler,
    sinks: SinkRegistry,
    metrics: RouterMetrics,
    accepting: AtomicBool,
    sync_timeout: Option<Duration>,
}

impl Router {
    /// Build a router over `counters` and `sinks`
    ///
    /// Operational metrics are registered into the counters' registry, and
    /// sink failures are counted there too. With `counting_enabled` off the
    /// counters are never touched but events are still forwarded.
    pub fn new(
        counters: Arc<CounterRegistry>,
        mut sinks: SinkRegistry,
        counting_enabled: bool,
    ) -> Result<Self> {
        let metrics = RouterMetrics::register(counters.registry())?;
        sinks.set_failure_counter(metrics.sink_failures.clone());

        Ok(Self {
            counters,
            classifier: Classifier::new(counting_enabled),
            dedup: DedupFilter::new(),
            resets: ResetScheduler::new(),
            sinks,
            metrics,
            accepting: AtomicBool::new(true),
            sync_timeout: Some(DEFAULT_SYNC_TIMEOUT),
        })
    }

    /// Bound the initial sync wait; `None` waits until stop
    pub fn with_sync_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Event counters
    pub fn counters(&self) -> &Arc<CounterRegistry> {
        &self.counters
    }

    /// Router self-metrics
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Registered sinks
    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    /// Whether callbacks are still being processed
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Serve until `stop` fires
    ///
    /// Fails with [`RouterError::CacheSync`] if the informer does not
    /// finish its initial list before `stop`, the sync timeout, or its own
    /// exit. Callbacks arriving after this returns are ignored.
    pub async fn run(&self, mut synced: HasSynced, mut stop: watch::Receiver<bool>) -> Result<()> {
        info!(
            counting = self.classifier.is_enabled(),
            sinks = self.sinks.count(),
            "Starting EventRouter"
        );

        if !wait_for_cache_sync(&mut stop, &mut synced, self.sync_timeout).await {
            error!("Timed out waiting for caches to sync");
            self.accepting.store(false, Ordering::Release);
            return Err(RouterError::CacheSync);
        }

        info!("Caches synced, routing events");

        let _ = stop.wait_for(|stopped| *stopped).await;
        self.accepting.store(false, Ordering::Release);

        info!(
            suppressed = self.metrics.updates_suppressed.get(),
            "Shutting down EventRouter"
        );
        Ok(())
    }

    async fn route(&self, event: &EventRecord, old: Option<&EventRecord>) {
        self.classifier.observe(&self.counters, event);
        self.sinks.deliver_to_all(event, old).await;
    }

    fn admit(&self, callback: &'static str, record: &EventRecord) -> bool {
        self.metrics.record_callback(callback);
        if self.is_accepting() {
            return true;
        }
        debug!(callback, event = %record.key(), "Router stopped, ignoring callback");
        false
    }
}

/// Run one callback body, logging instead of unwinding on panic
async fn guarded<F>(callback: &'static str, event: &EventRecord, body: F)
where
    F: Future<Output = ()>,
{
    if let Err(panic) = AssertUnwindSafe(body).catch_unwind().await {
        error!(
            callback,
            event = %event.key(),
            panic = panic_message(panic.as_ref()),
            "Recovered from panic in event callback"
        );
    }
}

#[async_trait]
impl EventHandler for Router {
    async fn on_add(&self, record: &EventRecord) {
        if !self.admit("add", record) {
            return;
        }
        guarded("add", record, self.route(record, None)).await;
    }

    async fn on_update(&self, old: &EventRecord, new: &EventRecord) {
        if !self.admit("update", new) {
            return;
        }
        guarded("update", new, async {
            match self.dedup.check(old, new) {
                UpdateVerdict::Suppressed => {
                    self.metrics.record_suppressed();
                    if self.resets.check(&self.counters) {
                        self.metrics.record_reset();
                    }
                }
                UpdateVerdict::Forward => self.route(new, Some(old)).await,
            }
        })
        .await;
    }

    async fn on_delete(&self, record: &EventRecord) {
        if !self.admit("delete", record) {
            return;
        }
        debug!(
            event = %record.key(),
            kind = %record.involved_object.kind,
            name = %record.involved_object.name,
            "Event deleted"
        );
    }
}
