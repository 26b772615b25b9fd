//! .th file reader

use crate::error::FormatError;
use crate::format::{SegmentRecord, ThFile, ThHeader, ThMetadata, MAGIC, VERSION};
use crate::writer::CRC64;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct ThReader;

impl ThReader {
    /// Read .th file
    pub fn read(path: &Path) -> Result<ThFile, FormatError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Read a full file image from any source.
    ///
    /// Segments come back in stored order; sort order of records is not
    /// re-validated.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<ThFile, FormatError> {
        let header = Self::read_header(reader)?;

        if header.magic != MAGIC {
            return Err(FormatError::BadMagic);
        }
        if header.version > VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: header.version,
                supported: VERSION,
            });
        }

        let metadata = Self::read_metadata(reader)?;

        // Sizes come from the file; read up to them instead of allocating them
        let stored = Self::read_bytes(reader, header.payload_size_stored, "payload")?;

        let actual = CRC64.checksum(&stored);
        if actual != header.checksum {
            return Err(FormatError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let payload = if header.is_compressed() {
            zstd::decode_all(stored.as_slice())?
        } else {
            stored
        };

        let segments: Vec<SegmentRecord> = bincode::deserialize(&payload)?;
        if segments.len() != header.num_segments as usize {
            return Err(FormatError::SegmentCountMismatch {
                expected: header.num_segments,
                actual: segments.len(),
            });
        }

        Ok(ThFile {
            header,
            metadata,
            segments,
        })
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<ThHeader, FormatError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        let version = Self::read_u16(reader)?;
        let flags = Self::read_u16(reader)?;
        let num_segments = Self::read_u32(reader)?;
        let num_records = Self::read_u32(reader)?;
        let metadata_size = Self::read_u64(reader)?;
        let payload_size = Self::read_u64(reader)?;
        let payload_size_stored = Self::read_u64(reader)?;
        let checksum = Self::read_u64(reader)?;
        let reserved = Self::read_u64(reader)?;

        Ok(ThHeader {
            magic,
            version,
            flags,
            num_segments,
            num_records,
            metadata_size,
            payload_size,
            payload_size_stored,
            checksum,
            reserved,
        })
    }

    fn read_metadata<R: Read>(reader: &mut R) -> Result<ThMetadata, FormatError> {
        let stream_id = Self::read_string(reader)?;
        let created_at = Self::read_string(reader)?;

        Ok(ThMetadata {
            stream_id,
            created_at,
        })
    }

    fn read_string<R: Read>(reader: &mut R) -> Result<String, FormatError> {
        let len = Self::read_u32(reader)?;
        let bytes = Self::read_bytes(reader, u64::from(len), "metadata")?;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_bytes<R: Read>(
        reader: &mut R,
        len: u64,
        section: &'static str,
    ) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::new();
        let read = reader.by_ref().take(len).read_to_end(&mut bytes)? as u64;
        if read < len {
            return Err(FormatError::Truncated {
                section,
                expected: len,
                actual: read,
            });
        }
        Ok(bytes)
    }

    fn read_u16<R: Read>(reader: &mut R) -> Result<u16, FormatError> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32<R: Read>(reader: &mut R) -> Result<u32, FormatError> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64<R: Read>(reader: &mut R) -> Result<u64, FormatError> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}
