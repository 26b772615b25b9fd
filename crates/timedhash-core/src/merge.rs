//! Pairwise segment merge
//!
//! Two segments of the same signal are stitched together when the right one
//! starts no earlier than the left one and no later than one tolerance past
//! its end. Records are interleaved by absolute time and re-anchored to the
//! left segment's start.

use crate::config::TimingConfig;
use crate::fingerprint::HashedFingerprint;
use crate::timed_hashes::{seconds_between, TimedHashes};
use std::borrow::Cow;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Why two segments cannot be merged
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("right segment starts {seconds:.3}s before the left one")]
    StartsEarlier { seconds: f64 },

    #[error("gap of {gap_s:.3}s between segments exceeds tolerance of {tolerance_s:.3}s")]
    Gap { gap_s: f64, tolerance_s: f64 },
}

/// Merges segments under a fixed timing configuration
#[derive(Debug, Clone)]
pub struct SegmentMerger {
    timing: TimingConfig,
}

impl SegmentMerger {
    pub fn new(timing: &TimingConfig) -> Self {
        Self { timing: *timing }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Check whether `right` can be merged into `left`.
    ///
    /// An empty `left` accepts anything. Otherwise `right` must not start
    /// before `left`, and `left` must end no earlier than one tolerance
    /// before `right` starts.
    pub fn check_compatibility(
        &self,
        left: &TimedHashes,
        right: &TimedHashes,
    ) -> Result<(), MergeError> {
        if left.is_empty() {
            return Ok(());
        }

        if left.starts_at() > right.starts_at() {
            return Err(MergeError::StartsEarlier {
                seconds: seconds_between(right.starts_at(), left.starts_at()),
            });
        }

        let right_offset = seconds_between(left.starts_at(), right.starts_at());
        let left_end = left.total_seconds(&self.timing);
        if left_end < right_offset - self.timing.tolerance_s {
            return Err(MergeError::Gap {
                gap_s: right_offset - left_end,
                tolerance_s: self.timing.tolerance_s,
            });
        }

        Ok(())
    }

    /// Merge, reporting why the segments were refused
    pub fn try_merge(
        &self,
        left: &TimedHashes,
        right: &TimedHashes,
    ) -> Result<TimedHashes, MergeError> {
        self.check_compatibility(left, right)?;

        if left.is_empty() {
            return Ok(right.clone());
        }

        let merged = interleave(left, right);
        log::trace!(
            "Merged {} + {} records anchored at {}",
            left.len(),
            right.len(),
            left.starts_at()
        );

        Ok(TimedHashes::new(merged, left.starts_at()))
    }

    /// Merge `right` into `left`, `None` when they are temporally disjoint.
    ///
    /// Merging into an empty segment yields `right` unchanged.
    pub fn merge(&self, left: &TimedHashes, right: &TimedHashes) -> Option<TimedHashes> {
        match self.try_merge(left, right) {
            Ok(merged) => Some(merged),
            Err(reason) => {
                log::trace!("Merge refused: {}", reason);
                None
            }
        }
    }
}

impl Default for SegmentMerger {
    fn default() -> Self {
        Self::new(&TimingConfig::default())
    }
}

/// Two-pointer interleave by absolute time. Ties go to `left`.
fn interleave(left: &TimedHashes, right: &TimedHashes) -> Vec<HashedFingerprint> {
    let first = in_sequence_order(left.hashed_fingerprints());
    let second = in_sequence_order(right.hashed_fingerprints());

    // Right-hand offsets are rewritten relative to the left anchor
    let time_offset = seconds_between(left.starts_at(), right.starts_at());

    let total = first.len() + second.len();
    let mut merged = Vec::with_capacity(total);
    let (mut i, mut j) = (0, 0);

    for k in 0..total {
        let sequence_number = k as u32;
        let take_first = match (first.get(i), second.get(j)) {
            (Some(a), Some(b)) => a.start_offset() <= time_offset + b.start_offset(),
            (Some(_), None) => true,
            (None, _) => false,
        };

        if take_first {
            let a = &first[i];
            merged.push(a.repositioned(sequence_number, a.start_offset()));
            i += 1;
        } else {
            let b = &second[j];
            merged.push(b.repositioned(sequence_number, time_offset + b.start_offset()));
            j += 1;
        }
    }

    merged
}

/// Records ordered by sequence number; borrowed when already in order
fn in_sequence_order(records: &[HashedFingerprint]) -> Cow<'_, [HashedFingerprint]> {
    let ordered = records
        .windows(2)
        .all(|w| w[0].sequence_number() <= w[1].sequence_number());
    if ordered {
        return Cow::Borrowed(records);
    }

    log::debug!("Re-sorting {} out-of-order records before merge", records.len());
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.sequence_number());
    Cow::Owned(sorted)
}
