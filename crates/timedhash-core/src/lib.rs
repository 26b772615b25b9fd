//! timedhash core - merging and windowing of timed fingerprint streams
//!
//! Segments of fingerprint records produced by an upstream acoustic hasher
//! are stitched together when they cover contiguous or slightly overlapping
//! audio, and consolidated into fixed-duration windows for indexing.

pub mod aggregate;
pub mod config;
pub mod fingerprint;
pub mod merge;
pub mod storage_backend;
pub mod storage_config;
pub mod timed_hashes;

pub use aggregate::{aggregate, WindowAggregator};
pub use config::{TimingConfig, WindowConfig};
pub use fingerprint::HashedFingerprint;
pub use merge::{MergeError, SegmentMerger};
pub use storage_backend::{FilesystemStore, SegmentStore};
pub use storage_config::{FileFormat, StorageConfig, TimedHashConfig};
pub use timed_hashes::TimedHashes;

/// Load segments from one segment file of any supported kind
pub fn load_segments(path: &std::path::Path) -> anyhow::Result<Vec<TimedHashes>> {
    let document = timedhash_fp::SegmentDocument::load_auto(path)?;
    storage_backend::segments_from_document(document)
}
