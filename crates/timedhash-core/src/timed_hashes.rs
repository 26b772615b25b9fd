//! Time-anchored runs of fingerprint records
//!
//! Record offsets are f64 seconds relative to `starts_at`. All time
//! comparisons are done in that relative form; conversion to and from
//! `DateTime<Utc>` only happens at the edges of this type.

use crate::config::TimingConfig;
use crate::fingerprint::HashedFingerprint;
use crate::merge::SegmentMerger;
use chrono::{DateTime, Duration, Utc};
use timedhash_fp::{FormatError, SegmentRecord, WireTimestamp};

/// An ordered run of fingerprint records anchored to an absolute start time.
///
/// Never mutated after construction: merging produces a new value. Records
/// are expected in `start_offset` order; construction does not check it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedHashes {
    hashed_fingerprints: Vec<HashedFingerprint>,
    starts_at: DateTime<Utc>,
}

impl TimedHashes {
    pub fn new(hashed_fingerprints: Vec<HashedFingerprint>, starts_at: DateTime<Utc>) -> Self {
        Self {
            hashed_fingerprints,
            starts_at,
        }
    }

    /// The identity element of merge: no records, anchored at the minimum time
    pub fn empty() -> Self {
        Self::new(Vec::new(), DateTime::<Utc>::MIN_UTC)
    }

    pub fn hashed_fingerprints(&self) -> &[HashedFingerprint] {
        &self.hashed_fingerprints
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn len(&self) -> usize {
        self.hashed_fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashed_fingerprints.is_empty()
    }

    /// Seconds from `starts_at` to the end of the last record's frame, 0 when empty
    pub fn total_seconds(&self, timing: &TimingConfig) -> f64 {
        match self.hashed_fingerprints.last() {
            Some(last) => last.start_offset() + timing.frame_duration_s,
            None => 0.0,
        }
    }

    /// Absolute end of the last record's frame, the minimum time when empty
    pub fn ends_at(&self, timing: &TimingConfig) -> DateTime<Utc> {
        if self.is_empty() {
            return DateTime::<Utc>::MIN_UTC;
        }
        offset_by(self.starts_at, self.total_seconds(timing))
    }

    /// Merge `other` into this segment, see [`SegmentMerger::merge`]
    pub fn merge_with(&self, other: &TimedHashes, timing: &TimingConfig) -> Option<TimedHashes> {
        SegmentMerger::new(timing).merge(self, other)
    }

    /// Persisted wire form (field 1: records, field 2: anchor)
    pub fn to_segment_record(&self) -> SegmentRecord {
        SegmentRecord {
            hashed_fingerprints: self
                .hashed_fingerprints
                .iter()
                .map(HashedFingerprint::to_record)
                .collect(),
            starts_at: WireTimestamp::from_datetime(&self.starts_at),
        }
    }

    /// Rebuild a segment from its persisted form.
    ///
    /// Records are kept in stored order; the producer is trusted for sorting.
    pub fn from_persisted(record: SegmentRecord) -> Result<Self, FormatError> {
        let starts_at = record.starts_at.to_datetime()?;
        let hashed_fingerprints = record
            .hashed_fingerprints
            .into_iter()
            .map(HashedFingerprint::from_record)
            .collect();
        Ok(Self::new(hashed_fingerprints, starts_at))
    }
}

impl Default for TimedHashes {
    fn default() -> Self {
        Self::empty()
    }
}

/// Signed seconds from `from` to `to`
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    let whole = delta.num_seconds();
    let nanos = (delta - Duration::seconds(whole))
        .num_nanoseconds()
        .unwrap_or_default();
    whole as f64 + nanos as f64 * 1e-9
}

/// `at` shifted by `seconds`, rounded to the nanosecond and saturating at the
/// representable range
pub(crate) fn offset_by(at: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    let shift = Duration::nanoseconds((seconds * 1e9).round() as i64);
    match at.checked_add_signed(shift) {
        Some(shifted) => shifted,
        None if seconds < 0.0 => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn at(seconds: i64, nanos: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, nanos).unwrap()
    }

    fn records(offsets: &[f64]) -> Vec<HashedFingerprint> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| {
                HashedFingerprint::new(vec![i as i32; 4], i as u32, offset, Vec::<String>::new())
            })
            .collect()
    }

    #[test]
    fn test_empty_segment_properties() {
        let timing = TimingConfig::default();
        let empty = TimedHashes::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.starts_at(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(empty.ends_at(&timing), DateTime::<Utc>::MIN_UTC);
        assert_eq!(empty.total_seconds(&timing), 0.0);
        assert_eq!(TimedHashes::default(), empty);
    }

    #[test]
    fn test_derived_end_and_duration() {
        let timing = TimingConfig::default();
        let segment = TimedHashes::new(records(&[0.0, 1.49, 2.98]), at(1_000, 0));

        assert_relative_eq!(segment.total_seconds(&timing), 4.466_211_901_306_241, epsilon = 1e-9);
        let ends_at = segment.ends_at(&timing);
        assert_eq!(ends_at, at(1_004, 466_211_901));
    }

    #[test]
    fn test_frame_duration_is_configurable() {
        let timing = TimingConfig {
            frame_duration_s: 0.5,
            ..TimingConfig::default()
        };
        let segment = TimedHashes::new(records(&[0.0, 1.0]), at(0, 0));
        assert_relative_eq!(segment.total_seconds(&timing), 1.5);
        assert_eq!(segment.ends_at(&timing), at(1, 500_000_000));
    }

    #[test]
    fn test_seconds_between_is_signed_and_precise() {
        assert_relative_eq!(seconds_between(at(10, 0), at(14, 470_000_000)), 4.47, epsilon = 1e-12);
        assert_relative_eq!(seconds_between(at(14, 470_000_000), at(10, 0)), -4.47, epsilon = 1e-12);
        assert_eq!(seconds_between(at(5, 1), at(5, 2)), 1e-9);
    }

    #[test]
    fn test_offset_by_saturates() {
        assert_eq!(offset_by(DateTime::<Utc>::MAX_UTC, 10.0), DateTime::<Utc>::MAX_UTC);
        assert_eq!(offset_by(DateTime::<Utc>::MIN_UTC, -10.0), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_persisted_form_keeps_stored_order() {
        // Deliberately out of order: persistence must not re-sort.
        let unsorted = TimedHashes::new(records(&[2.0, 0.0, 1.0]), at(1_700_000_000, 42));
        let record = unsorted.to_segment_record();
        assert_eq!(record.starts_at.nanos, 42);

        let restored = TimedHashes::from_persisted(record).unwrap();
        assert_eq!(restored, unsorted);
        let offsets: Vec<f64> = restored
            .hashed_fingerprints()
            .iter()
            .map(|r| r.start_offset())
            .collect();
        assert_eq!(offsets, vec![2.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_segment_persists_with_sentinel() {
        let restored = TimedHashes::from_persisted(TimedHashes::empty().to_segment_record()).unwrap();
        assert_eq!(restored, TimedHashes::empty());
    }
}
