//! Configuration options for a diff session.

use std::time::Duration;

use buffer_diff::DiffConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::overlay::AnchorMode;
use crate::scheduler::DEFAULT_QUIET_PERIOD;

/// Configuration options for a diff session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionOptions {
    /// How long the working text must stay unchanged before a rebuild.
    pub quiet_period: Duration,

    /// Where chunk controls are anchored.
    pub anchor_mode: AnchorMode,

    /// Settings for the built-in differ.
    pub diff: DiffConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            anchor_mode: AnchorMode::default(),
            diff: DiffConfig::default(),
        }
    }
}

impl SessionOptions {
    /// Create new session options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce quiet period.
    pub fn quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Set the anchor mode for chunk controls.
    pub fn anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.anchor_mode = mode;
        self
    }

    /// Set the diff configuration.
    pub fn diff(mut self, diff: DiffConfig) -> Self {
        self.diff = diff;
        self
    }
}
