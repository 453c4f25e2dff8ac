use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `SttsBox` struct represents a Time-to-Sample Box in the MP4 file format.
// It run-length encodes the decode duration of every sample: each entry says that the
// next `sample_count` samples each last `sample_delta` media timescale units.
#[derive(Default, Clone)]
pub struct SttsBox { // Time-to-Sample Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SttsEntry>,
    pub span: Range<u64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

impl SttsBox {
    /// Total number of samples covered by the runs.
    pub fn sample_count(&self) -> u64 {
        self.entries.iter().map(|e| e.sample_count as u64).sum()
    }
}

impl std::fmt::Debug for SttsBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SttsBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("entry_count", &self.entries.len())
            .field("entries", &self.entries.iter().take(4).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for SttsBox {
    fn box_type(&self) -> [u8; 4] { *b"stts" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(8)?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(SttsEntry {
                sample_count: payload.u32()?,
                sample_delta: payload.u32()?,
            });
        }

        Ok(SttsBox { version, flags, entries, span: header.span() })
    }
}
