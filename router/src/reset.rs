//! Periodic counter reset
//!
//! Resync replays arrive as no-op updates for every cached event. The
//! router uses them as a heartbeat: each one asks the [`ResetScheduler`]
//! whether the counters are due to be wiped.

use crate::counters::CounterRegistry;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// Minimum time between two counter resets
pub const RESET_INTERVAL: Duration = Duration::from_secs(30 * 60);

struct ResetState {
    last_reset: Option<Instant>,
    has_reset_once: bool,
}

/// Owns the last-reset bookkeeping and performs resets when due
///
/// The state is only reachable through [`check`](Self::check) and
/// [`check_at`](Self::check_at), which decide and reset under one lock.
pub struct ResetScheduler {
    state: Mutex<ResetState>,
}

impl ResetScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ResetState {
                last_reset: None,
                has_reset_once: false,
            }),
        }
    }

    /// Reset `counters` if due, using the current time
    pub fn check(&self, counters: &CounterRegistry) -> bool {
        self.check_at(counters, Instant::now())
    }

    /// Reset `counters` if due as of `now`
    ///
    /// A reset is due on the very first call, when no reset time has been
    /// recorded, or once [`RESET_INTERVAL`] has elapsed since the last one.
    /// Returns whether a reset happened.
    pub fn check_at(&self, counters: &CounterRegistry, now: Instant) -> bool {
        let mut state = self.state.lock();

        let since_last = state
            .last_reset
            .map(|last| now.saturating_duration_since(last));
        let due = match since_last {
            _ if !state.has_reset_once => true,
            None => true,
            Some(elapsed) => elapsed >= RESET_INTERVAL,
        };
        if !due {
            return false;
        }

        info!(since_last_reset = ?since_last, "Resetting event counters");
        counters.reset_all();
        state.last_reset = Some(now);
        state.has_reset_once = true;
        true
    }
}

impl Default for ResetScheduler {
    fn default() -> Self {
        Self::new()
    }
}
