//! Storage backend trait and implementations
//!
//! The seam between this crate and whatever persists segments upstream or
//! indexes windows downstream. Only a filesystem backend lives here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use timedhash_fp::{FileKind, SegmentDocument, ThMetadata};

use crate::storage_config::{FileFormat, StorageConfig};
use crate::timed_hashes::TimedHashes;

/// Suffix that marks a file holding aggregated windows
const WINDOWS_SUFFIX: &str = ".windows";

/// Abstract storage backend trait
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Identifiers of all streams with stored segments
    async fn list_streams(&self) -> Result<Vec<String>>;

    /// Load the segments of one stream, in stored order
    async fn load_segments(&self, stream_id: &str) -> Result<Vec<TimedHashes>>;

    /// Load the segments of every stream
    async fn load_all_segments(&self) -> Result<Vec<(String, Vec<TimedHashes>)>>;

    /// Store raw segments for a stream, replacing any previous ones
    async fn save_segments(&self, stream_id: &str, segments: &[TimedHashes]) -> Result<()>;

    /// Hand aggregated windows to the downstream consumer
    async fn save_windows(&self, stream_id: &str, windows: &[TimedHashes]) -> Result<()>;
}

/// Build a persistable document for a stream
pub fn document_from_segments(stream_id: &str, segments: &[TimedHashes]) -> SegmentDocument {
    SegmentDocument::new(
        ThMetadata::new(stream_id),
        segments.iter().map(TimedHashes::to_segment_record).collect(),
    )
}

/// Rebuild segments from a loaded document, keeping stored order
pub fn segments_from_document(document: SegmentDocument) -> Result<Vec<TimedHashes>> {
    let stream_id = document.metadata.stream_id;
    document
        .segments
        .into_iter()
        .map(TimedHashes::from_persisted)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid segment in stream {}", stream_id))
}

/// Filesystem-based storage backend
pub struct FilesystemStore {
    base_dir: PathBuf,
    format: FileFormat,
    compress: bool,
}

impl FilesystemStore {
    /// Create a new filesystem backend
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_directory),
            format: config.format,
            compress: config.compress,
        }
    }

    /// Create from directory path and format
    pub fn from_path(base_dir: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            base_dir: base_dir.into(),
            format,
            compress: true,
        }
    }

    fn segments_path(&self, stream_id: &str, kind: FileKind) -> PathBuf {
        self.base_dir.join(format!("{}.{}", stream_id, kind.extension()))
    }

    /// Where `save_windows` writes the windows of a stream
    pub fn windows_path(&self, stream_id: &str) -> PathBuf {
        let kind = self.format.write_kind();
        self.base_dir
            .join(format!("{}{}.{}", stream_id, WINDOWS_SUFFIX, kind.extension()))
    }

    /// Find the segment file for a stream
    fn find_file(&self, stream_id: &str) -> Result<PathBuf> {
        self.format
            .read_kinds()
            .into_iter()
            .map(|kind| self.segments_path(stream_id, kind))
            .find(|path| path.exists())
            .with_context(|| format!("Segment file not found for stream: {}", stream_id))
    }

    fn load_stream(&self, stream_id: &str) -> Result<Vec<TimedHashes>> {
        let path = self.find_file(stream_id)?;
        let document = SegmentDocument::load_auto(&path)?;
        segments_from_document(document)
    }

    fn save_document(&self, path: PathBuf, stream_id: &str, segments: &[TimedHashes]) -> Result<()> {
        let document = document_from_segments(stream_id, segments);
        document.save(&path, self.format.write_kind(), self.compress)?;
        log::debug!(
            "Wrote {} segments ({} records) to {}",
            segments.len(),
            document.num_records(),
            path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl SegmentStore for FilesystemStore {
    async fn list_streams(&self) -> Result<Vec<String>> {
        let accepted = self.format.read_kinds();
        let entries = std::fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read directory {}", self.base_dir.display()))?;

        let mut streams: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                FileKind::from_path(path)
                    .map(|kind| accepted.contains(&kind))
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .filter(|stem| !stem.ends_with(WINDOWS_SUFFIX))
            .collect();

        streams.sort();
        streams.dedup();
        Ok(streams)
    }

    async fn load_segments(&self, stream_id: &str) -> Result<Vec<TimedHashes>> {
        self.load_stream(stream_id)
    }

    async fn load_all_segments(&self) -> Result<Vec<(String, Vec<TimedHashes>)>> {
        use rayon::prelude::*;

        let streams = self.list_streams().await?;

        // Load all files in parallel
        let results: Vec<(String, Vec<TimedHashes>)> = streams
            .par_iter()
            .filter_map(|stream_id| match self.load_stream(stream_id) {
                Ok(segments) => Some((stream_id.clone(), segments)),
                Err(e) => {
                    log::warn!("Failed to load stream {}: {:#}", stream_id, e);
                    None
                }
            })
            .collect();

        Ok(results)
    }

    async fn save_segments(&self, stream_id: &str, segments: &[TimedHashes]) -> Result<()> {
        let path = self.segments_path(stream_id, self.format.write_kind());
        self.save_document(path, stream_id, segments)
    }

    async fn save_windows(&self, stream_id: &str, windows: &[TimedHashes]) -> Result<()> {
        let path = self.windows_path(stream_id);
        self.save_document(path, stream_id, windows)
    }
}
