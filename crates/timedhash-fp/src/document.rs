//! Format-independent view of a segment file

use crate::format::{FileKind, SegmentRecord, ThMetadata};
use crate::json_format::ThJsonFile;
use crate::reader::ThReader;
use crate::writer::ThWriter;
use anyhow::{Context, Result};
use std::path::Path;

/// Metadata plus segments, whatever the file kind
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDocument {
    pub metadata: ThMetadata,
    pub segments: Vec<SegmentRecord>,
}

impl SegmentDocument {
    pub fn new(metadata: ThMetadata, segments: Vec<SegmentRecord>) -> Self {
        Self { metadata, segments }
    }

    pub fn num_records(&self) -> usize {
        self.segments.iter().map(|s| s.hashed_fingerprints.len()).sum()
    }

    /// Load any supported file, detecting the kind from its extension
    pub fn load_auto(path: &Path) -> Result<Self> {
        let kind = FileKind::from_path(path)
            .with_context(|| format!("Unsupported segment file extension: {}", path.display()))?;

        let document = match kind {
            FileKind::Binary => {
                let file = ThReader::read(path)
                    .with_context(|| format!("Failed to read .th file: {}", path.display()))?;
                Self::new(file.metadata, file.segments)
            }
            FileKind::Json => {
                let file = ThJsonFile::load(path)
                    .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
                Self::new(file.metadata, file.segments)
            }
            FileKind::Bson => {
                let file = ThJsonFile::load_bson(path)
                    .with_context(|| format!("Failed to read BSON file: {}", path.display()))?;
                Self::new(file.metadata, file.segments)
            }
        };

        Ok(document)
    }

    /// Save with the kind given by the file extension
    pub fn save_auto(&self, path: &Path, compress: bool) -> Result<()> {
        let kind = FileKind::from_path(path)
            .with_context(|| format!("Unsupported segment file extension: {}", path.display()))?;
        self.save(path, kind, compress)
    }

    /// Save as the given kind. `compress` only affects the binary container.
    pub fn save(&self, path: &Path, kind: FileKind, compress: bool) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }

        match kind {
            FileKind::Binary => {
                ThWriter::new()
                    .with_compression(compress)
                    .write(path, &self.metadata, &self.segments)
                    .with_context(|| format!("Failed to write .th file: {}", path.display()))?;
            }
            FileKind::Json | FileKind::Bson => {
                let mut file = ThJsonFile::new(self.metadata.clone());
                for segment in &self.segments {
                    file.add_segment(segment.clone());
                }
                let written = if kind == FileKind::Json {
                    file.save(path)
                } else {
                    file.save_bson(path)
                };
                written.with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }

        Ok(())
    }
}
