use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `CttsBox` struct represents a Composition Time-to-Sample Box in the MP4 file format.
// Runs of per-sample offsets from decode time to presentation time. Offsets are read as
// signed in both versions; version 0 files never store values above `i32::MAX` in practice.
#[derive(Default, Clone)]
pub struct CttsBox { // Composition Time-to-Sample Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<CttsEntry>,
    pub span: Range<u64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CttsEntry {
    pub sample_count: u32,
    pub sample_offset: i32,
}

impl std::fmt::Debug for CttsBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CttsBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("entry_count", &self.entries.len())
            .field("entries", &self.entries.iter().take(4).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for CttsBox {
    fn box_type(&self) -> [u8; 4] { *b"ctts" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(8)?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(CttsEntry {
                sample_count: payload.u32()?,
                sample_offset: payload.i32()?,
            });
        }

        Ok(CttsBox { version, flags, entries, span: header.span() })
    }
}
