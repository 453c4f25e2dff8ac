use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `StscBox` struct represents a Sample-to-Chunk Box in the MP4 file format.
// This box maps samples to chunks as a list of runs: each entry applies from its
// `first_chunk` (1-based) up to the chunk before the next entry's `first_chunk`, and the
// last entry applies through the final chunk.
//
// Fields:
// - `version`: Full box version (usually 0).
// - `flags`: Full box flags (24 bits, usually 0).
// - `entries`: The runs, in the order stored in the file.
// - `span`: Position of the box, used to point at it when the runs are inconsistent.
#[derive(Default, Clone)]
pub struct StscBox { // Sample-to-Chunk Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<StscEntry>,
    pub span: Range<u64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

impl std::fmt::Debug for StscBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StscBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("entries", &self.entries)
            .finish()
    }
}

impl Mp4Box for StscBox {
    fn box_type(&self) -> [u8; 4] { *b"stsc" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.entry_count(12)?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(StscEntry {
                first_chunk: payload.u32()?,
                samples_per_chunk: payload.u32()?,
                sample_description_index: payload.u32()?,
            });
        }

        Ok(StscBox { version, flags, entries, span: header.span() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Mp4Error, reader::tests::{full_boxed, read_single}};

    #[test]
    fn reads_runs() {
        let mut body = 2u32.to_be_bytes().to_vec();
        for value in [1u32, 2, 1, 2, 1, 1] {
            body.extend_from_slice(&value.to_be_bytes());
        }
        let stsc: StscBox = read_single(&full_boxed(b"stsc", 0, 0, &body)).unwrap();
        assert_eq!(stsc.entries.len(), 2);
        assert_eq!(stsc.entries[1], StscEntry { first_chunk: 2, samples_per_chunk: 1, sample_description_index: 1 });
    }

    #[test]
    fn short_table_is_malformed() {
        let mut body = 2u32.to_be_bytes().to_vec();
        for value in [1u32, 2, 1] {
            body.extend_from_slice(&value.to_be_bytes());
        }
        let result = read_single::<StscBox>(&full_boxed(b"stsc", 0, 0, &body));
        assert!(matches!(result, Err(Mp4Error::MalformedBox { box_type, .. }) if &box_type == b"stsc"));
    }
}
