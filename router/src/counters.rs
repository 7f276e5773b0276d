//! Event counters by severity and origin
//!
//! Four independent Prometheus counter families, one per [`Severity`], all
//! labelled by the same five-tuple taken from the event record. The
//! [`CounterRegistry`] owns its own `prometheus::Registry`; nothing is
//! registered process-wide.
//!
//! Increments and resets are serialised through a read/write gate: any
//! number of increments may run at once, a reset waits for them and blocks
//! new ones until every family has been cleared.

use crate::error::Result;
use eventrouter_core::{EventRecord, Severity};
use parking_lot::RwLock;
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

/// Label names shared by all four families, in value order
pub const LABELS: [&str; 5] = [
    "involved_object_kind",
    "involved_object_name",
    "involved_object_namespace",
    "reason",
    "source",
];

/// Label values identifying one counter series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub reason: String,
    pub source: String,
}

impl CounterKey {
    /// Build the key an event record is counted under
    pub fn from_record(record: &EventRecord) -> Self {
        Self {
            kind: record.involved_object.kind.clone(),
            name: record.involved_object.name.clone(),
            namespace: record.involved_object.namespace.clone(),
            reason: record.reason.clone(),
            source: record.source.clone(),
        }
    }

    /// Label values in [`LABELS`] order
    pub fn values(&self) -> [&str; 5] {
        [
            &self.kind,
            &self.name,
            &self.namespace,
            &self.reason,
            &self.source,
        ]
    }

    fn matches(&self, labels: &[prometheus::proto::LabelPair]) -> bool {
        labels.iter().all(|pair| {
            LABELS
                .iter()
                .position(|name| *name == pair.get_name())
                .is_some_and(|idx| self.values()[idx] == pair.get_value())
        })
    }
}

/// The four severity-keyed counter aggregates
pub struct CounterRegistry {
    registry: Registry,
    normal: IntCounterVec,
    warning: IntCounterVec,
    info: IntCounterVec,
    unknown: IntCounterVec,
    gate: RwLock<()>,
}

impl CounterRegistry {
    /// Create the aggregates in a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create the aggregates and register them in `registry`
    ///
    /// Fails if a family with the same name is already registered there.
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let normal = family(
            &registry,
            "kube_eventrouter_normal_total",
            "Total number of normal events in the kubernetes cluster",
        )?;
        let warning = family(
            &registry,
            "kube_eventrouter_warnings_total",
            "Total number of warning events in the kubernetes cluster",
        )?;
        let info = family(
            &registry,
            "kube_eventrouter_info_total",
            "Total number of info events in the kubernetes cluster",
        )?;
        let unknown = family(
            &registry,
            "kube_eventrouter_unknown_total",
            "Total number of events of unknown type in the kubernetes cluster",
        )?;

        Ok(Self {
            registry,
            normal,
            warning,
            info,
            unknown,
            gate: RwLock::new(()),
        })
    }

    /// The Prometheus registry the families live in
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn aggregate(&self, severity: Severity) -> &IntCounterVec {
        match severity {
            Severity::Normal => &self.normal,
            Severity::Warning => &self.warning,
            Severity::Info => &self.info,
            Severity::Unknown => &self.unknown,
        }
    }

    /// Add one to the series `key` in the `severity` aggregate
    ///
    /// Errors when the label handle cannot be resolved; nothing is counted
    /// in that case.
    pub fn increment(&self, severity: Severity, key: &CounterKey) -> Result<()> {
        let _gate = self.gate.read();
        let counter = self
            .aggregate(severity)
            .get_metric_with_label_values(&key.values())?;
        counter.inc();
        Ok(())
    }

    /// Current value of a series, 0 when it does not exist
    ///
    /// Reading never creates the series.
    pub fn count(&self, severity: Severity, key: &CounterKey) -> u64 {
        let _gate = self.gate.read();
        self.aggregate(severity)
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| key.matches(metric.get_label()))
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Number of live series in an aggregate
    pub fn series(&self, severity: Severity) -> usize {
        let _gate = self.gate.read();
        self.aggregate(severity)
            .collect()
            .iter()
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Clear every series in all four aggregates
    pub fn reset_all(&self) {
        let _gate = self.gate.write();
        for severity in Severity::ALL {
            self.aggregate(severity).reset();
        }
    }

    /// Encode everything in the registry as Prometheus text format
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let families = {
            let _gate = self.gate.read();
            self.registry.gather()
        };
        let mut buffer = Vec::new();
        if encoder.encode(&families, &mut buffer).is_ok() {
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }
}

fn family(registry: &Registry, name: &str, help: &str) -> Result<IntCounterVec> {
    let vec = IntCounterVec::new(Opts::new(name, help), &LABELS)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

/// Counts event records into the registry
///
/// When counting is disabled every call is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    enabled: bool,
}

impl Classifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one observation of `record`
    ///
    /// Returns the aggregate that was incremented, or `None` when counting
    /// is disabled or the label handle could not be resolved.
    pub fn observe(&self, counters: &CounterRegistry, record: &EventRecord) -> Option<Severity> {
        if !self.enabled {
            return None;
        }

        let severity = record.severity();
        let key = CounterKey::from_record(record);
        match counters.increment(severity, &key) {
            Ok(()) => Some(severity),
            Err(e) => {
                warn!(
                    severity = %severity,
                    kind = %key.kind,
                    name = %key.name,
                    namespace = %key.namespace,
                    error = %e,
                    "Failed to resolve event counter"
                );
                None
            }
        }
    }
}
