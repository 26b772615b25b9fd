//! JSON and BSON document formats
//!
//! Self-describing alternatives to the binary .th container. Both share the
//! same document shape, BSON is just the binary encoding of it.

use crate::error::FormatError;
use crate::format::{SegmentRecord, ThMetadata};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version tag written into every document
pub const DOCUMENT_VERSION: &str = "1.0";

/// Complete JSON/BSON segment document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThJsonFile {
    pub version: String,
    pub metadata: ThMetadata,
    pub num_segments: usize,
    pub num_records: usize,
    pub segments: Vec<SegmentRecord>,
}

impl ThJsonFile {
    /// Create an empty document for a stream
    pub fn new(metadata: ThMetadata) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            metadata,
            num_segments: 0,
            num_records: 0,
            segments: Vec::new(),
        }
    }

    /// Add a segment
    pub fn add_segment(&mut self, segment: SegmentRecord) {
        self.num_records += segment.hashed_fingerprints.len();
        self.num_segments += 1;
        self.segments.push(segment);
    }

    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bson(&self) -> Result<Vec<u8>, FormatError> {
        Ok(bson::to_vec(self)?)
    }

    pub fn from_bson(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(bson::from_slice(bytes)?)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let json_str = std::fs::read_to_string(path)?;
        Self::from_json(&json_str)
    }

    /// Save to BSON file
    pub fn save_bson(&self, path: &Path) -> Result<(), FormatError> {
        std::fs::write(path, self.to_bson()?)?;
        Ok(())
    }

    /// Load from BSON file
    pub fn load_bson(path: &Path) -> Result<Self, FormatError> {
        let bytes = std::fs::read(path)?;
        Self::from_bson(&bytes)
    }
}
