//! Stdout sink
//!
//! Writes one JSON document per delivery:
//!
//! ```text
//! {"verb":"UPDATED","event":{...},"old_event":{...}}
//! ```
//!
//! `old_event` is omitted for adds. Suited to log shippers that tail the
//! container's standard output.

use super::{verb, PluginError, Sink};
use async_trait::async_trait;
use eventrouter_core::EventRecord;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Serialize)]
struct Envelope<'a> {
    verb: &'static str,
    event: &'a EventRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_event: Option<&'a EventRecord>,
}

/// Stdout sink - prints one JSON line per delivery
pub struct StdoutSink {
    /// Pretty print instead of one line per event
    pretty: bool,
    /// Count of events written
    delivered_count: AtomicU64,
}

impl StdoutSink {
    /// Create a new StdoutSink
    pub fn new() -> Self {
        Self {
            pretty: false,
            delivered_count: AtomicU64::new(0),
        }
    }

    /// Create a new StdoutSink with pretty printing
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            delivered_count: AtomicU64::new(0),
        }
    }

    /// Get total events written
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// Render a delivery the way it is written to stdout
    pub fn render(
        &self,
        event: &EventRecord,
        old: Option<&EventRecord>,
    ) -> Result<String, PluginError> {
        let envelope = Envelope {
            verb: verb(old),
            event,
            old_event: old,
        };
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&envelope)
        } else {
            serde_json::to_string(&envelope)
        };
        rendered.map_err(|e| PluginError::Encode(e.to_string()))
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn deliver(
        &self,
        event: &EventRecord,
        old: Option<&EventRecord>,
    ) -> Result<(), PluginError> {
        use std::io::Write;

        let line = self.render(event, old)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")
            .map_err(|e| PluginError::Send(format!("stdout write failed: {e}")))?;

        self.delivered_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), PluginError> {
        use std::io::Write;

        std::io::stdout()
            .flush()
            .map_err(|e| PluginError::Shutdown(format!("stdout flush failed: {e}")))
    }
}
