use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::{fixed::FixedPoint32, generic::Mp4Box};

/// The `ElstBox` struct represents an Edit List Box (`elst`) in the MP4 file format.
/// It defines the mapping from media time to presentation time.
///
/// Fields:
/// - `version`: 0 stores durations and times in 32 bits, 1 in 64 bits.
/// - `entries`: List of edit entries, each specifying a segment duration, media time, and playback rate.
#[derive(Default, Clone)]
pub struct ElstBox { // Edit List Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<ElstEntry>, // List of edit entries
}

/// A single edit. A `media_time` of -1 marks an empty edit (a presentation gap).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ElstEntry {
    pub segment_duration: u64,
    pub media_time: i64,
    pub media_rate: FixedPoint32,
}

impl ElstEntry {
    pub fn is_empty_edit(&self) -> bool {
        self.media_time == -1
    }
}

impl std::fmt::Debug for ElstBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElstBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("entries", &self.entries)
            .finish()
    }
}

impl Mp4Box for ElstBox {
    fn box_type(&self) -> [u8; 4] { *b"elst" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_size = if version == 1 { 20 } else { 12 };
        let entry_count = payload.entry_count(entry_size)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let (segment_duration, media_time) = if version == 1 {
                (payload.u64()?, payload.i64()?)
            } else {
                (payload.u32()? as u64, payload.i32()? as i64)
            };
            let media_rate = FixedPoint32(payload.u32()?);
            entries.push(ElstEntry { segment_duration, media_time, media_rate });
        }

        Ok(ElstBox { version, flags, entries })
    }
}
