//! Hashed fingerprint records
//!
//! One record is a fixed-size hash payload produced by the upstream hasher,
//! positioned in time relative to the segment that owns it.

use std::sync::Arc;
use timedhash_fp::FingerprintRecord;

/// A single fingerprint record.
///
/// Hash bins and cluster labels are opaque here and shared between copies,
/// so renumbering a record on merge never duplicates its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HashedFingerprint {
    hash_bins: Arc<[i32]>,
    sequence_number: u32,
    start_offset: f64,
    clusters: Arc<[String]>,
}

impl HashedFingerprint {
    pub fn new(
        hash_bins: impl Into<Arc<[i32]>>,
        sequence_number: u32,
        start_offset: f64,
        clusters: impl Into<Arc<[String]>>,
    ) -> Self {
        Self {
            hash_bins: hash_bins.into(),
            sequence_number,
            start_offset,
            clusters: clusters.into(),
        }
    }

    pub fn hash_bins(&self) -> &[i32] {
        &self.hash_bins
    }

    /// Position within the owning segment
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Seconds from the owning segment's start
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    pub fn clusters(&self) -> &[String] {
        &self.clusters
    }

    /// Same payload at a new position; hash bins and clusters are shared
    pub(crate) fn repositioned(&self, sequence_number: u32, start_offset: f64) -> Self {
        Self {
            hash_bins: Arc::clone(&self.hash_bins),
            sequence_number,
            start_offset,
            clusters: Arc::clone(&self.clusters),
        }
    }

    pub(crate) fn to_record(&self) -> FingerprintRecord {
        FingerprintRecord {
            hash_bins: self.hash_bins.to_vec(),
            sequence_number: self.sequence_number,
            start_offset: self.start_offset,
            clusters: self.clusters.to_vec(),
        }
    }

    pub(crate) fn from_record(record: FingerprintRecord) -> Self {
        Self::new(
            record.hash_bins,
            record.sequence_number,
            record.start_offset,
            record.clusters,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repositioned_shares_payload() {
        let fp = HashedFingerprint::new(vec![1, 2, 3], 4, 0.5, vec!["a".to_string()]);
        let moved = fp.repositioned(0, 2.0);

        assert_eq!(moved.sequence_number(), 0);
        assert_eq!(moved.start_offset(), 2.0);
        assert_eq!(moved.hash_bins(), fp.hash_bins());
        assert!(Arc::ptr_eq(&moved.hash_bins, &fp.hash_bins));
        assert!(Arc::ptr_eq(&moved.clusters, &fp.clusters));
    }

    #[test]
    fn test_record_conversion_keeps_fields() {
        let fp = HashedFingerprint::new(vec![9, 8], 3, 4.25, vec!["x".to_string(), "y".to_string()]);
        let record = fp.to_record();
        assert_eq!(record.hash_bins, vec![9, 8]);
        assert_eq!(record.sequence_number, 3);
        assert_eq!(record.clusters.len(), 2);
        assert_eq!(HashedFingerprint::from_record(record), fp);
    }
}
