//! Segment file format structures
//!
//! The wire structs here are the stable persisted shape of a timed hash
//! segment. Field order is the field numbering: `hashed_fingerprints` is
//! field 1 and `starts_at` is field 2. Never reorder them, previously
//! persisted segments are decoded positionally by bincode.

use crate::error::FormatError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes for .th files: "THSH"
pub const MAGIC: [u8; 4] = [0x54, 0x48, 0x53, 0x48];

/// Current format version
pub const VERSION: u16 = 1;

/// Size of the fixed binary header in bytes
pub const HEADER_SIZE: usize = 56;

/// Header flag: payload is zstd-compressed
pub const FLAG_COMPRESSED: u16 = 0x1;

/// File header (56 bytes fixed size)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThHeader {
    /// Magic bytes: "THSH"
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Flags (bit 0: compressed)
    pub flags: u16,
    /// Number of segments in the payload
    pub num_segments: u32,
    /// Total number of fingerprint records across all segments
    pub num_records: u32,
    /// Size of metadata section
    pub metadata_size: u64,
    /// Size of payload (uncompressed)
    pub payload_size: u64,
    /// Size of payload as stored on disk
    pub payload_size_stored: u64,
    /// CRC64 checksum of the stored payload
    pub checksum: u64,
    /// Reserved
    pub reserved: u64,
}

impl ThHeader {
    pub fn new(num_segments: u32, num_records: u32, metadata_size: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            num_segments,
            num_records,
            metadata_size,
            payload_size: 0,
            payload_size_stored: 0,
            checksum: 0,
            reserved: 0,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & FLAG_COMPRESSED) != 0
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        if compressed {
            self.flags |= FLAG_COMPRESSED;
        } else {
            self.flags &= !FLAG_COMPRESSED;
        }
    }
}

/// Metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThMetadata {
    /// Identifier of the audio stream the segments belong to
    pub stream_id: String,
    /// Creation time (RFC 3339)
    pub created_at: String,
}

impl ThMetadata {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Absolute timestamp as seconds + nanoseconds since the Unix epoch.
///
/// Covers the whole `DateTime<Utc>` range, including the minimum sentinel
/// used by empty segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl WireTimestamp {
    pub fn from_datetime(at: &DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }

    pub fn to_datetime(self) -> Result<DateTime<Utc>, FormatError> {
        Utc.timestamp_opt(self.seconds, self.nanos)
            .single()
            .ok_or(FormatError::InvalidTimestamp {
                seconds: self.seconds,
                nanos: self.nanos,
            })
    }
}

/// One persisted fingerprint record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub hash_bins: Vec<i32>,
    pub sequence_number: u32,
    /// Seconds from the owning segment's `starts_at`
    pub start_offset: f64,
    pub clusters: Vec<String>,
}

/// One persisted segment (field 1: records, field 2: anchor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub hashed_fingerprints: Vec<FingerprintRecord>,
    pub starts_at: WireTimestamp,
}

/// Complete .th file structure
#[derive(Debug, Clone)]
pub struct ThFile {
    pub header: ThHeader,
    pub metadata: ThMetadata,
    pub segments: Vec<SegmentRecord>,
}

/// On-disk representation, picked by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Binary,
    Json,
    Bson,
}

impl FileKind {
    /// Detect kind from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("th") => Some(FileKind::Binary),
            Some("json") => Some(FileKind::Json),
            Some("bson") => Some(FileKind::Bson),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Binary => "th",
            FileKind::Json => "json",
            FileKind::Bson => "bson",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_compression_flag() {
        let mut header = ThHeader::new(2, 10, 32);
        assert!(!header.is_compressed());
        header.set_compressed(true);
        assert!(header.is_compressed());
        assert_eq!(header.flags, FLAG_COMPRESSED);
        header.set_compressed(false);
        assert!(!header.is_compressed());
    }

    #[test]
    fn test_minimum_timestamp_survives_wire_form() {
        let min = DateTime::<Utc>::MIN_UTC;
        let wire = WireTimestamp::from_datetime(&min);
        assert_eq!(wire.to_datetime().unwrap(), min);
    }

    #[test]
    fn test_subsecond_precision_kept() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let wire = WireTimestamp::from_datetime(&at);
        assert_eq!(wire.nanos, 123_456_789);
        assert_eq!(wire.to_datetime().unwrap(), at);
    }

    #[test]
    fn test_invalid_nanos_rejected() {
        let wire = WireTimestamp {
            seconds: 0,
            nanos: 2_000_000_000,
        };
        assert!(matches!(
            wire.to_datetime(),
            Err(FormatError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/b.th")), Some(FileKind::Binary));
        assert_eq!(FileKind::from_path(Path::new("b.json")), Some(FileKind::Json));
        assert_eq!(FileKind::from_path(Path::new("b.bson")), Some(FileKind::Bson));
        assert_eq!(FileKind::from_path(Path::new("b.wav")), None);
    }

    #[test]
    fn test_records_encode_before_anchor() {
        // Empty record list first (u64 length 0), then the anchor seconds.
        let segment = SegmentRecord {
            hashed_fingerprints: Vec::new(),
            starts_at: WireTimestamp {
                seconds: 7,
                nanos: 0,
            },
        };
        let bytes = bincode::serialize(&segment).unwrap();
        assert_eq!(&bytes[0..8], &0u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &7i64.to_le_bytes());
        assert_eq!(&bytes[16..20], &0u32.to_le_bytes());
    }
}
