use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `StcoBox` struct represents a Chunk Offset Box in the MP4 file format.
// One absolute file offset per chunk, in chunk order. Files larger than 4 GiB use `co64`.
#[derive(Default, Clone)]
pub struct StcoBox { // Chunk Offset Box
    pub version: u8,
    pub flags: u32,
    pub chunk_offsets: Vec<u32>,
    pub span: Range<u64>,
}

impl std::fmt::Debug for StcoBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StcoBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("entry_count", &self.chunk_offsets.len())
            .field("chunk_offsets", &self.chunk_offsets.iter().take(8).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for StcoBox {
    fn box_type(&self) -> [u8; 4] { *b"stco" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(4)?;
        let mut chunk_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            chunk_offsets.push(payload.u32()?);
        }

        Ok(StcoBox { version, flags, chunk_offsets, span: header.span() })
    }
}
