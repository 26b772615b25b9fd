//! Errors raised while encoding or decoding segment files

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid .th file: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported .th version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    #[error("payload checksum mismatch: header {expected:#018x}, payload {actual:#018x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("truncated {section}: expected {expected} bytes, found {actual}")]
    Truncated {
        section: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("header declares {expected} segments but payload holds {actual}")]
    SegmentCountMismatch { expected: u32, actual: usize },

    #[error("timestamp out of range: {seconds}s + {nanos}ns")]
    InvalidTimestamp { seconds: i64, nanos: u32 },

    #[error("metadata is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON encode error: {0}")]
    BsonEncode(#[from] bson::ser::Error),

    #[error("BSON decode error: {0}")]
    BsonDecode(#[from] bson::de::Error),
}
