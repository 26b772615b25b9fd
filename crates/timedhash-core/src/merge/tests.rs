//! Tests for pairwise merge

use super::*;
use approx::assert_relative_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(seconds: i64, nanos: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, nanos).unwrap()
}

/// Segment whose records carry `tag` in their first hash bin
fn segment(starts_at: DateTime<Utc>, offsets: &[f64], tag: i32) -> TimedHashes {
    let fingerprints = offsets
        .iter()
        .enumerate()
        .map(|(i, &offset)| {
            HashedFingerprint::new(
                vec![tag, i as i32],
                i as u32,
                offset,
                vec![format!("cluster-{}", tag)],
            )
        })
        .collect();
    TimedHashes::new(fingerprints, starts_at)
}

fn offsets(segment: &TimedHashes) -> Vec<f64> {
    segment
        .hashed_fingerprints()
        .iter()
        .map(|r| r.start_offset())
        .collect()
}

fn tags(segment: &TimedHashes) -> Vec<i32> {
    segment
        .hashed_fingerprints()
        .iter()
        .map(|r| r.hash_bins()[0])
        .collect()
}

fn assert_sequence_is_contiguous(segment: &TimedHashes) {
    for (k, record) in segment.hashed_fingerprints().iter().enumerate() {
        assert_eq!(record.sequence_number(), k as u32);
    }
}

#[test]
fn test_empty_is_left_identity() {
    let merger = SegmentMerger::default();
    let x = segment(at(1_000, 0), &[0.0, 1.49, 2.98], 1);

    let merged = merger.merge(&TimedHashes::empty(), &x).unwrap();
    assert_eq!(merged, x);

    let both_empty = merger
        .merge(&TimedHashes::empty(), &TimedHashes::empty())
        .unwrap();
    assert!(both_empty.is_empty());
}

#[test]
fn test_example_scenario() {
    let timing = TimingConfig::default();
    let a = segment(at(0, 0), &[0.0, 1.49, 2.98], 1);
    let b = segment(at(4, 470_000_000), &[0.0, 1.49], 2);

    assert_relative_eq!(a.total_seconds(&timing), 4.466_211_901_306_241, epsilon = 1e-9);

    let merged = a.merge_with(&b, &timing).unwrap();
    assert_eq!(merged.len(), 5);
    assert_eq!(merged.starts_at(), a.starts_at());
    assert_sequence_is_contiguous(&merged);

    let expected = [0.0, 1.49, 2.98, 4.47, 5.96];
    for (actual, expected) in offsets(&merged).iter().zip(expected) {
        assert_relative_eq!(*actual, expected, epsilon = 1e-9);
    }
    assert_eq!(tags(&merged), vec![1, 1, 1, 2, 2]);
}

#[test]
fn test_overlapping_segments_interleave() {
    let merger = SegmentMerger::default();
    let a = segment(at(100, 0), &[0.0, 1.0, 2.0, 3.0], 1);
    let b = segment(at(100, 500_000_000), &[0.0, 1.0, 2.0], 2);

    let merged = merger.merge(&a, &b).unwrap();

    assert_eq!(merged.len(), a.len() + b.len());
    assert_eq!(tags(&merged), vec![1, 2, 1, 2, 1, 2, 1]);
    assert_sequence_is_contiguous(&merged);

    let merged_offsets = offsets(&merged);
    assert!(merged_offsets.windows(2).all(|w| w[0] <= w[1]));

    // Records from b are shifted by b.starts_at - a.starts_at
    let shifted: Vec<f64> = merged
        .hashed_fingerprints()
        .iter()
        .filter(|r| r.hash_bins()[0] == 2)
        .map(|r| r.start_offset())
        .collect();
    for (actual, original) in shifted.iter().zip([0.0, 1.0, 2.0]) {
        assert_relative_eq!(*actual, original + 0.5, epsilon = 1e-9);
    }
}

#[test]
fn test_payload_copied_unchanged() {
    let merger = SegmentMerger::default();
    let a = segment(at(0, 0), &[0.0], 7);
    let b = segment(at(1, 0), &[0.0], 8);

    let merged = merger.merge(&a, &b).unwrap();
    let second = &merged.hashed_fingerprints()[1];
    assert_eq!(second.hash_bins(), &[8, 0]);
    assert_eq!(second.clusters(), &["cluster-8".to_string()]);
}

#[test]
fn test_ties_favor_left_segment() {
    let merger = SegmentMerger::default();
    let a = segment(at(50, 0), &[0.0, 1.0], 1);
    let b = segment(at(51, 0), &[0.0, 1.0], 2);

    let merged = merger.merge(&a, &b).unwrap();
    assert_eq!(tags(&merged), vec![1, 1, 2, 2]);
}

#[test]
fn test_identical_start_merges_both() {
    let merger = SegmentMerger::default();
    let a = segment(at(10, 0), &[0.0, 2.0], 1);
    let b = segment(at(10, 0), &[1.0], 2);

    let merged = merger.merge(&a, &b).unwrap();
    assert_eq!(tags(&merged), vec![1, 2, 1]);
    assert_eq!(offsets(&merged), vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_tolerance_boundary() {
    let timing = TimingConfig::default();
    let merger = SegmentMerger::new(&timing);
    let base = at(1_000, 0);
    let a = segment(base, &[0.0], 1);

    // a ends one frame after base; b may start up to one tolerance later
    let limit_ns = ((timing.frame_duration_s + timing.tolerance_s) * 1e9).round() as i64;

    let inside = segment(base + Duration::nanoseconds(limit_ns - 2), &[0.0], 2);
    let outside = segment(base + Duration::nanoseconds(limit_ns + 2), &[0.0], 2);

    assert!(merger.merge(&a, &inside).is_some());
    assert!(merger.merge(&a, &outside).is_none());

    match merger.check_compatibility(&a, &outside) {
        Err(MergeError::Gap { gap_s, tolerance_s }) => {
            assert_relative_eq!(tolerance_s, 1.48);
            assert!(gap_s > tolerance_s);
        }
        other => panic!("expected a gap error, got {:?}", other),
    }
}

#[test]
fn test_zero_tolerance_requires_contiguity() {
    let timing = TimingConfig {
        frame_duration_s: 1.0,
        tolerance_s: 0.0,
    };
    let merger = SegmentMerger::new(&timing);
    let a = segment(at(0, 0), &[0.0, 1.0], 1);

    let contiguous = segment(at(2, 0), &[0.0], 2);
    let gapped = segment(at(2, 100_000_000), &[0.0], 2);

    assert!(merger.merge(&a, &contiguous).is_some());
    assert!(merger.merge(&a, &gapped).is_none());
}

#[test]
fn test_right_starting_earlier_is_refused() {
    let merger = SegmentMerger::default();
    let a = segment(at(10, 0), &[0.0, 1.0], 1);
    let b = segment(at(9, 0), &[0.0, 1.0], 2);

    assert!(merger.merge(&a, &b).is_none());
    assert!(matches!(
        merger.check_compatibility(&a, &b),
        Err(MergeError::StartsEarlier { .. })
    ));
}

#[test]
fn test_empty_right_is_refused_by_non_empty_left() {
    let merger = SegmentMerger::default();
    let a = segment(at(10, 0), &[0.0], 1);
    assert!(merger.merge(&a, &TimedHashes::empty()).is_none());
}

#[test]
fn test_out_of_order_input_is_resorted() {
    let merger = SegmentMerger::default();
    let shuffled = TimedHashes::new(
        vec![
            HashedFingerprint::new(vec![1, 1], 1, 1.0, Vec::<String>::new()),
            HashedFingerprint::new(vec![1, 0], 0, 0.0, Vec::<String>::new()),
        ],
        at(0, 0),
    );
    let b = segment(at(2, 0), &[0.0], 2);

    let merged = merger.merge(&shuffled, &b).unwrap();
    assert_eq!(offsets(&merged), vec![0.0, 1.0, 2.0]);
    assert_sequence_is_contiguous(&merged);
}

#[test]
fn test_inputs_are_left_untouched() {
    let merger = SegmentMerger::default();
    let a = segment(at(0, 0), &[0.0, 1.0], 1);
    let b = segment(at(1, 0), &[0.0, 1.0], 2);
    let (a_before, b_before) = (a.clone(), b.clone());

    let _ = merger.merge(&a, &b).unwrap();

    assert_eq!(a, a_before);
    assert_eq!(b, b_before);
}

#[test]
fn test_merge_is_repeatable() {
    let merger = SegmentMerger::default();
    let a = segment(at(0, 0), &[0.0, 1.0], 1);
    let b = segment(at(2, 0), &[0.0, 1.0], 2);
    let c = segment(at(4, 0), &[0.0], 3);

    let ab = merger.merge(&a, &b).unwrap();
    let abc = merger.merge(&ab, &c).unwrap();

    assert_eq!(abc.len(), 5);
    assert_eq!(tags(&abc), vec![1, 1, 2, 2, 3]);
    assert_eq!(offsets(&abc), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_sequence_is_contiguous(&abc);
}
