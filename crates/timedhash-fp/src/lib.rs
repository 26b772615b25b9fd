//! timedhash segment file format library

pub mod document;
pub mod error;
pub mod format;
pub mod json_format;
pub mod reader;
pub mod writer;

pub use document::SegmentDocument;
pub use error::FormatError;
pub use format::{
    FileKind, FingerprintRecord, SegmentRecord, ThFile, ThHeader, ThMetadata, WireTimestamp,
    HEADER_SIZE, MAGIC, VERSION,
};
pub use json_format::ThJsonFile;
pub use reader::ThReader;
pub use writer::ThWriter;
