//! Sink system for the router
//!
//! Sinks receive every substantive add and update. All registered sinks
//! receive each delivery in a fan-out pattern.

pub mod log;
pub mod registry;
pub mod stdout;

// Re-export Sink trait from eventrouter-core
// External sinks depend on eventrouter-core directly
pub use eventrouter_core::PluginError;
pub use eventrouter_core::Sink;

pub use log::LogSink;
pub use registry::SinkRegistry;
pub use stdout::StdoutSink;

/// Verb describing a delivery, as rendered by the built-in sinks
pub(crate) fn verb(old: Option<&eventrouter_core::EventRecord>) -> &'static str {
    if old.is_some() {
        "UPDATED"
    } else {
        "ADDED"
    }
}
