//! eventrouter-core - Core types for the eventrouter controller
//!
//! This crate provides the types shared between the router and the sinks
//! it delivers to:
//!
//! - [`EventRecord`] - the typed snapshot of a cluster event
//! - [`Severity`] - the closed set of severity classes events are counted under
//! - [`Sink`] trait - async interface for delivering records to destinations
//! - [`PluginError`] - error type for sink operations
//!
//! Sinks living outside the router crate depend on this crate only.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod error;
/// Event record and severity types
pub mod record;
mod sink;

pub use error::PluginError;
pub use record::{EventRecord, ObjectReference, Severity};
pub use sink::Sink;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    // ==========================================================================
    // PluginError Tests
    // ==========================================================================

    #[test]
    fn test_plugin_error_encode_display() {
        let err = PluginError::Encode("invalid utf-8".to_string());
        assert_eq!(err.to_string(), "encode failed: invalid utf-8");
    }

    #[test]
    fn test_plugin_error_send_display() {
        let err = PluginError::Send("broken pipe".to_string());
        assert_eq!(err.to_string(), "send failed: broken pipe");
    }

    #[test]
    fn test_plugin_error_shutdown_display() {
        let err = PluginError::Shutdown("flush failed".to_string());
        assert_eq!(err.to_string(), "shutdown error: flush failed");
    }

    #[test]
    fn test_plugin_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PluginError>();
    }

    // ==========================================================================
    // Severity Tests
    // ==========================================================================

    #[test]
    fn test_severity_known_types() {
        assert_eq!(Severity::from_type("Normal"), Severity::Normal);
        assert_eq!(Severity::from_type("Warning"), Severity::Warning);
        assert_eq!(Severity::from_type("Info"), Severity::Info);
    }

    #[test]
    fn test_severity_is_case_sensitive() {
        assert_eq!(Severity::from_type("warning"), Severity::Unknown);
        assert_eq!(Severity::from_type("NORMAL"), Severity::Unknown);
        assert_eq!(Severity::from_type(" Info"), Severity::Unknown);
    }

    #[test]
    fn test_severity_fallback() {
        assert_eq!(Severity::from_type("Unusual"), Severity::Unknown);
        assert_eq!(Severity::from_type(""), Severity::Unknown);
    }

    // ==========================================================================
    // EventRecord Tests
    // ==========================================================================

    fn sample() -> EventRecord {
        EventRecord::new("ns1", "p1.17a2b")
            .with_type("Warning")
            .with_involved_object(ObjectReference::new("Pod", "p1", "ns1"))
            .with_reason("Failed")
            .with_message("Back-off pulling image")
            .with_source("kubelet")
            .with_resource_version("5")
    }

    #[test]
    fn test_record_builder() {
        let record = sample();
        assert_eq!(record.severity(), Severity::Warning);
        assert_eq!(record.involved_object.kind, "Pod");
        assert_eq!(record.source, "kubelet");
        assert_eq!(record.resource_version, "5");
        assert_eq!(record.count, 0);
    }

    #[test]
    fn test_record_key() {
        assert_eq!(sample().key(), "ns1/p1.17a2b");
        assert_eq!(EventRecord::new("", "node-event").key(), "node-event");
    }

    #[test]
    fn test_record_serializes_type_field() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "Warning");
        assert_eq!(json["involvedObject"]["namespace"], "ns1");
        assert_eq!(json["resourceVersion"], "5");
        assert!(json.get("eventType").is_none());
    }

    #[test]
    fn test_record_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventRecord>();
    }

    // ==========================================================================
    // Sink Trait Tests
    // ==========================================================================

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct TestSink {
        delivered: AtomicU64,
        updates: AtomicU64,
    }

    #[async_trait::async_trait]
    impl Sink for TestSink {
        fn name(&self) -> &'static str {
            "test-sink"
        }

        async fn deliver(
            &self,
            _event: &EventRecord,
            old: Option<&EventRecord>,
        ) -> Result<(), PluginError> {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            if old.is_some() {
                self.updates.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sink_is_object_safe() {
        let inner = Arc::new(TestSink {
            delivered: AtomicU64::new(0),
            updates: AtomicU64::new(0),
        });
        let sink: Arc<dyn Sink> = inner.clone();

        let record = sample();
        sink.deliver(&record, None).await.unwrap();
        sink.deliver(&record, Some(&record)).await.unwrap();

        assert_eq!(sink.name(), "test-sink");
        assert_eq!(inner.delivered.load(Ordering::Relaxed), 2);
        assert_eq!(inner.updates.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_sink_defaults() {
        let sink = TestSink {
            delivered: AtomicU64::new(0),
            updates: AtomicU64::new(0),
        };
        assert!(sink.health().await);
        assert!(sink.shutdown().await.is_ok());
    }
}
