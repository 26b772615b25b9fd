//! .th file writer

use crate::error::FormatError;
use crate::format::{SegmentRecord, ThHeader, ThMetadata};
use crc::{Crc, CRC_64_ECMA_182};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub(crate) const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

const ZSTD_LEVEL: i32 = 3;

pub struct ThWriter {
    compress: bool,
}

impl ThWriter {
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// Enable or disable zstd compression of the payload
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Write .th file, returning the header that was written
    pub fn write(
        &self,
        path: &Path,
        metadata: &ThMetadata,
        segments: &[SegmentRecord],
    ) -> Result<ThHeader, FormatError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = self.write_to(&mut writer, metadata, segments)?;
        writer.flush()?;
        Ok(header)
    }

    /// Write the full file image to any sink
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        metadata: &ThMetadata,
        segments: &[SegmentRecord],
    ) -> Result<ThHeader, FormatError> {
        let payload = bincode::serialize(segments)?;
        let stored = if self.compress {
            zstd::encode_all(payload.as_slice(), ZSTD_LEVEL)?
        } else {
            payload.clone()
        };

        let num_records: usize = segments.iter().map(|s| s.hashed_fingerprints.len()).sum();
        let metadata_size = metadata_len(metadata);

        let mut header = ThHeader::new(segments.len() as u32, num_records as u32, metadata_size);
        header.set_compressed(self.compress);
        header.payload_size = payload.len() as u64;
        header.payload_size_stored = stored.len() as u64;
        header.checksum = CRC64.checksum(&stored);

        self.write_header(writer, &header)?;
        self.write_metadata(writer, metadata)?;
        writer.write_all(&stored)?;

        Ok(header)
    }

    fn write_header<W: Write>(&self, writer: &mut W, header: &ThHeader) -> Result<(), FormatError> {
        // Write as little-endian binary
        writer.write_all(&header.magic)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&header.flags.to_le_bytes())?;
        writer.write_all(&header.num_segments.to_le_bytes())?;
        writer.write_all(&header.num_records.to_le_bytes())?;
        writer.write_all(&header.metadata_size.to_le_bytes())?;
        writer.write_all(&header.payload_size.to_le_bytes())?;
        writer.write_all(&header.payload_size_stored.to_le_bytes())?;
        writer.write_all(&header.checksum.to_le_bytes())?;
        writer.write_all(&header.reserved.to_le_bytes())?;

        Ok(())
    }

    fn write_metadata<W: Write>(&self, writer: &mut W, metadata: &ThMetadata) -> Result<(), FormatError> {
        // Both strings length-prefixed
        for field in [&metadata.stream_id, &metadata.created_at] {
            let bytes = field.as_bytes();
            writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
            writer.write_all(bytes)?;
        }

        Ok(())
    }
}

impl Default for ThWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn metadata_len(metadata: &ThMetadata) -> u64 {
    (4 + metadata.stream_id.len() + 4 + metadata.created_at.len()) as u64
}
