use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// Sync Sample Box: the 1-based numbers of the random access samples, ascending.
// Without it every sample is a sync sample.
#[derive(Default, Clone)]
pub struct StssBox {
    pub version: u8,
    pub flags: u32,
    pub sample_numbers: Vec<u32>,
    pub span: Range<u64>,
}

impl std::fmt::Debug for StssBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StssBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("entry_count", &self.sample_numbers.len())
            .field("sample_numbers", &self.sample_numbers.iter().take(8).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for StssBox {
    fn box_type(&self) -> [u8; 4] { *b"stss" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(4)?;
        let mut sample_numbers = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            sample_numbers.push(payload.u32()?);
        }

        Ok(StssBox { version, flags, sample_numbers, span: header.span() })
    }
}
