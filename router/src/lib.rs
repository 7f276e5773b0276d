//! eventrouter - count and forward Kubernetes events
//!
//! Watches cluster events, counts each substantive observation into
//! severity-keyed Prometheus counters, and forwards it to the configured
//! sinks.
//!
//! ```text
//! Informer ──► Router ──► DedupFilter ──► Classifier ──► CounterRegistry
//!                                    │
//!                                    └──► SinkRegistry ──► Sinks
//! ```
//!
//! Resync replays (same `resourceVersion` on both sides of an update) are
//! neither counted nor forwarded; instead they give the [`ResetScheduler`]
//! a chance to clear all counters, at most once every 30 minutes.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod controller;
pub mod counters;
pub mod dedup;
pub mod error;
pub mod informer;
pub mod metrics;
pub mod metrics_server;
pub mod reset;
pub mod sink;

pub use config::{Config, LogFormat, SinkKind};
pub use controller::Router;
pub use counters::{Classifier, CounterKey, CounterRegistry};
pub use dedup::{DedupFilter, UpdateVerdict};
pub use error::{PluginError, Result, RouterError};
pub use informer::{EventHandler, HasSynced, KubeEventInformer, SyncNotifier};
pub use metrics::RouterMetrics;
pub use metrics_server::MetricsServer;
pub use reset::{ResetScheduler, RESET_INTERVAL};
pub use sink::{LogSink, Sink, SinkRegistry, StdoutSink};

pub use eventrouter_core::{EventRecord, ObjectReference, Severity};
