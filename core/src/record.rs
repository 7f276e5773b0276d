//! The event record observed by the router
//!
//! An [`EventRecord`] is a snapshot of one cluster `Event` object as the
//! informer saw it. The router never mutates a record and never keeps one
//! past the callback that delivered it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the object an event is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Kind of the referent, e.g. `Pod`
    pub kind: String,
    /// Name of the referent
    pub name: String,
    /// Namespace of the referent (empty for cluster-scoped objects)
    pub namespace: String,
}

impl ObjectReference {
    /// Create a reference from its three parts
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// Snapshot of a cluster event notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Name of the Event object itself
    pub name: String,
    /// Namespace of the Event object itself
    pub namespace: String,
    /// Severity class as reported upstream (`Normal`, `Warning`, ...)
    #[serde(rename = "type")]
    pub event_type: String,
    /// The object this event describes
    pub involved_object: ObjectReference,
    /// Short machine-readable cause
    pub reason: String,
    /// Human-readable description
    #[serde(default)]
    pub message: String,
    /// Host or component that reported the event
    pub source: String,
    /// Opaque version token assigned by the upstream store
    pub resource_version: String,
    /// How many times upstream has seen this occurrence
    #[serde(default)]
    pub count: i32,
}

impl EventRecord {
    /// Start a record with the given identity; everything else is empty
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the upstream `type` string
    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Set the involved object
    pub fn with_involved_object(mut self, object: ObjectReference) -> Self {
        self.involved_object = object;
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the reporting source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the resource version
    pub fn with_resource_version(mut self, version: impl Into<String>) -> Self {
        self.resource_version = version.into();
        self
    }

    /// Resolve the severity class of this record
    pub fn severity(&self) -> Severity {
        Severity::from_type(&self.event_type)
    }

    /// `namespace/name` key identifying the Event object
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Severity class of an event
///
/// Upstream `type` values are matched exactly and case-sensitively; every
/// other value, including the empty string, is [`Severity::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// `type: Normal`
    Normal,
    /// `type: Warning`
    Warning,
    /// `type: Info`
    Info,
    /// Any other `type`
    Unknown,
}

impl Severity {
    /// All severity classes, in a stable order
    pub const ALL: [Severity; 4] = [
        Severity::Normal,
        Severity::Warning,
        Severity::Info,
        Severity::Unknown,
    ];

    /// Map an upstream `type` string to its class
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "Normal" => Severity::Normal,
            "Warning" => Severity::Warning,
            "Info" => Severity::Info,
            _ => Severity::Unknown,
        }
    }

    /// Lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
