//! Log sink
//!
//! Emits each delivery as a structured `tracing` event, so events end up
//! wherever the process logs go.

use super::{verb, PluginError, Sink};
use async_trait::async_trait;
use eventrouter_core::EventRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Log sink - one info line per delivery
pub struct LogSink {
    delivered_count: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            delivered_count: AtomicU64::new(0),
        }
    }

    /// Get total events logged
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(
        &self,
        event: &EventRecord,
        old: Option<&EventRecord>,
    ) -> Result<(), PluginError> {
        info!(
            target: "eventrouter::events",
            verb = verb(old),
            event = %event.key(),
            event_type = %event.event_type,
            kind = %event.involved_object.kind,
            name = %event.involved_object.name,
            namespace = %event.involved_object.namespace,
            reason = %event.reason,
            source = %event.source,
            resource_version = %event.resource_version,
            old_resource_version = old.map(|o| o.resource_version.as_str()),
            "{}",
            event.message
        );
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_counts() {
        let sink = LogSink::new();
        let record = EventRecord::new("ns1", "p1.evt").with_message("Started container");

        sink.deliver(&record, None).await.unwrap();
        sink.deliver(&record, Some(&record)).await.unwrap();

        assert_eq!(sink.delivered_count(), 2);
        assert_eq!(sink.name(), "log");
    }
}
