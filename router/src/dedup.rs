//! Resync replay detection
//!
//! The informer re-delivers every cached event as an update on each
//! resync. Those replays carry the same `resourceVersion` on both sides, a
//! real change never does, so version equality is the whole test.

use eventrouter_core::EventRecord;

/// Outcome of inspecting one update callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateVerdict {
    /// Something changed: count and forward the new snapshot
    Forward,
    /// Resync replay: neither count nor forward
    Suppressed,
}

/// Distinguishes substantive updates from resync replays
///
/// Stateless; suppressed replays are counted by the router's
/// `eventrouter_updates_suppressed_total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedupFilter;

impl DedupFilter {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `old -> new` is a real change
    pub fn check(&self, old: &EventRecord, new: &EventRecord) -> UpdateVerdict {
        if old.resource_version == new.resource_version {
            tracing::debug!(
                event = %new.key(),
                resource_version = %new.resource_version,
                "Potential reset happening, old and new matching resource versions"
            );
            UpdateVerdict::Suppressed
        } else {
            UpdateVerdict::Forward
        }
    }
}
