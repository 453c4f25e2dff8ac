use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// Chunk Offset Box with 64-bit offsets. Same table as `stco`.
#[derive(Default, Clone)]
pub struct Co64Box {
    pub version: u8,
    pub flags: u32,
    pub chunk_offsets: Vec<u64>,
    pub span: Range<u64>,
}

impl std::fmt::Debug for Co64Box {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Co64Box")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("entry_count", &self.chunk_offsets.len())
            .field("chunk_offsets", &self.chunk_offsets.iter().take(8).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for Co64Box {
    fn box_type(&self) -> [u8; 4] { *b"co64" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(8)?;
        let mut chunk_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            chunk_offsets.push(payload.u64()?);
        }

        Ok(Co64Box { version, flags, chunk_offsets, span: header.span() })
    }
}
