//! Windowing of segment streams
//!
//! Consolidates many short, possibly overlapping segments into windows of
//! roughly `target_length_s` seconds. Segments are folded into a stack of
//! accumulators: a window closes at the first merge reaching the target
//! length, or early when the next segment cannot be merged.

use crate::config::{TimingConfig, WindowConfig};
use crate::merge::SegmentMerger;
use crate::timed_hashes::TimedHashes;

/// Aggregates segments into windows
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    merger: SegmentMerger,
    window: WindowConfig,
}

impl WindowAggregator {
    pub fn new(timing: &TimingConfig, window: &WindowConfig) -> Self {
        Self {
            merger: SegmentMerger::new(timing),
            window: window.clone(),
        }
    }

    /// Aggregate `segments` into windows, in chronological order.
    ///
    /// Input order does not matter, segments are sorted by `starts_at`
    /// (stable for equal anchors). Empty windows are dropped unless
    /// `keep_empty_windows` is set, in which case the output mirrors the
    /// accumulator stack including its empty placeholders.
    pub fn aggregate(&self, mut segments: Vec<TimedHashes>) -> Vec<TimedHashes> {
        segments.sort_by_key(|s| s.starts_at());

        let timing = *self.merger.timing();
        let target = self.window.target_length_s;
        let input_count = segments.len();

        let mut stack = vec![TimedHashes::empty()];

        for next in segments {
            let current = stack.pop().unwrap_or_default();
            match self.merger.try_merge(&current, &next) {
                Ok(merged) => {
                    let reached_target = merged.total_seconds(&timing) >= target;
                    if reached_target {
                        log::debug!(
                            "Closed window at {} ({:.2}s, {} records)",
                            merged.starts_at(),
                            merged.total_seconds(&timing),
                            merged.len()
                        );
                    }
                    stack.push(merged);
                    if reached_target {
                        stack.push(TimedHashes::empty());
                    }
                }
                Err(reason) => {
                    log::debug!(
                        "Window boundary before segment at {}: {}",
                        next.starts_at(),
                        reason
                    );
                    stack.push(current);
                    stack.push(next);
                }
            }
        }

        // Pop order is newest first
        let mut windows = Vec::with_capacity(stack.len());
        while let Some(window) = stack.pop() {
            windows.push(window);
        }
        windows.reverse();

        if !self.window.keep_empty_windows {
            windows.retain(|w| !w.is_empty());
        }

        log::info!(
            "Aggregated {} segments into {} windows (target {:.1}s)",
            input_count,
            windows.len(),
            target
        );

        windows
    }
}

/// Aggregate with the default timing, dropping empty windows
pub fn aggregate(segments: Vec<TimedHashes>, target_length_s: f64) -> Vec<TimedHashes> {
    WindowAggregator::new(
        &TimingConfig::default(),
        &WindowConfig::with_target_length(target_length_s),
    )
    .aggregate(segments)
}
