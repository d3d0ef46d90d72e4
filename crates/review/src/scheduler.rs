//! Debouncing of working-text edits into diff rebuilds.
//!
//! The scheduler holds no timer of its own. The owner reports edits with
//! `schedule` and polls `take_due` from its event loop; whatever time the
//! poll happens at, a burst of edits produces a single rebuild.

use log::{debug, trace};
use std::time::{Duration, Instant};

/// Default quiet period between the last edit and the rebuild
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Coalesces edit bursts into rebuilds and guards against re-entrant rebuilds
#[derive(Debug, Clone)]
pub struct RebuildScheduler {
    quiet_period: Duration,
    pending: bool,
    /// None while pending means the deadline is past what `Instant` can
    /// hold; only an explicit flush runs that rebuild
    deadline: Option<Instant>,
    in_progress: bool,
    rerun_requested: bool,
    rebuilds: u64,
}

impl Default for RebuildScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl RebuildScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: false,
            deadline: None,
            in_progress: false,
            rerun_requested: false,
            rebuilds: 0,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Arm the timer for `now + quiet_period`, replacing any pending deadline.
    ///
    /// While a rebuild is running the request is folded into one follow-up
    /// cycle instead.
    pub fn schedule(&mut self, now: Instant) {
        if self.in_progress {
            debug!("Rebuild requested while one is running, deferring");
            self.rerun_requested = true;
            return;
        }

        if self.pending {
            trace!("Replacing pending rebuild deadline");
        }
        self.arm(now);
    }

    fn arm(&mut self, now: Instant) {
        self.pending = true;
        self.deadline = now.checked_add(self.quiet_period);
        if self.deadline.is_none() {
            debug!("Quiet period {:?} overflows the clock, rebuild waits for a flush", self.quiet_period);
        }
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.rerun_requested = false;
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the quiet period has elapsed. Disarms the timer when it
    /// fires, so each deadline fires exactly once.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.pending && now >= deadline && !self.in_progress => {
                self.pending = false;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Enter a rebuild. Returns false, and remembers the request, if a
    /// rebuild is already running.
    pub fn begin(&mut self) -> bool {
        if self.in_progress {
            debug!("Collapsing re-entrant rebuild");
            self.rerun_requested = true;
            return false;
        }
        self.in_progress = true;
        true
    }

    /// Leave a rebuild. A request made while it ran is armed for the next cycle.
    pub fn finish(&mut self, now: Instant) {
        self.in_progress = false;
        self.rebuilds += 1;

        if std::mem::take(&mut self.rerun_requested) {
            self.arm(now);
        }
    }

    pub fn is_rebuilding(&self) -> bool {
        self.in_progress
    }

    /// Number of rebuilds completed so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
