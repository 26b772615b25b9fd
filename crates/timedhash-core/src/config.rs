//! Timing and windowing parameters
//!
//! Frame duration and merge tolerance are inherited from the upstream hasher
//! (8192-sample frames at 5512 Hz, 1.48 s accuracy margin). They are
//! configuration, not something this crate derives.

use serde::{Deserialize, Serialize};

/// Upstream hasher frame size in samples
pub const UPSTREAM_FRAME_SIZE: f64 = 8192.0;

/// Upstream hasher sample rate in Hz
pub const UPSTREAM_SAMPLE_RATE: f64 = 5512.0;

/// Default time span covered by one fingerprint record, in seconds
pub const DEFAULT_FRAME_DURATION_S: f64 = UPSTREAM_FRAME_SIZE / UPSTREAM_SAMPLE_RATE;

/// Default maximum gap between two mergeable segments, in seconds
pub const DEFAULT_TOLERANCE_S: f64 = 1.48;

/// Timing parameters used by the derived segment properties and by merge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Seconds covered by one record
    #[serde(default = "default_frame_duration")]
    pub frame_duration_s: f64,
    /// Allowed gap between the end of one segment and the start of the next
    #[serde(default = "default_tolerance")]
    pub tolerance_s: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_duration_s: DEFAULT_FRAME_DURATION_S,
            tolerance_s: DEFAULT_TOLERANCE_S,
        }
    }
}

fn default_frame_duration() -> f64 {
    DEFAULT_FRAME_DURATION_S
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_S
}

impl TimingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.frame_duration_s.is_finite() || self.frame_duration_s <= 0.0 {
            anyhow::bail!("frame_duration_s must be a finite value > 0");
        }
        if !self.tolerance_s.is_finite() || self.tolerance_s < 0.0 {
            anyhow::bail!("tolerance_s must be a finite value >= 0");
        }
        Ok(())
    }
}

/// Windowing parameters for aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// A window closes at the first merge reaching this many seconds
    #[serde(default = "default_target_length")]
    pub target_length_s: f64,
    /// Keep the empty accumulators left on the stack in the output
    #[serde(default)]
    pub keep_empty_windows: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            target_length_s: default_target_length(),
            keep_empty_windows: false,
        }
    }
}

fn default_target_length() -> f64 {
    10.0
}

impl WindowConfig {
    pub fn with_target_length(target_length_s: f64) -> Self {
        Self {
            target_length_s,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.target_length_s.is_finite() || self.target_length_s <= 0.0 {
            anyhow::bail!("target_length_s must be a finite value > 0");
        }
        Ok(())
    }
}
