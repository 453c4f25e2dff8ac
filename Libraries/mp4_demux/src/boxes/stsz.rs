use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `StszBox` struct represents a Sample Size Box in the MP4 file format.
// It includes a default sample size (if all samples are the same size) and a table of sample sizes (if samples have varying sizes).
//
// Fields:
// - `sample_size`: The common sample size. If this value is 0, the sizes are listed in `entry_sizes`.
// - `sample_count`: The number of samples in the track. This is the authoritative sample count.
// - `entry_sizes`: One size per sample when `sample_size` is 0, empty otherwise.
#[derive(Default, Clone)]
pub struct StszBox { // Sample Size Box
    pub version: u8,
    pub flags: u32,
    pub sample_size: u32, // Default sample size
    pub sample_count: u32,
    pub entry_sizes: Vec<u32>, // List of sample sizes
    pub span: Range<u64>,
}

impl StszBox {
    /// Size of the 0-based sample `index`.
    pub fn size_of(&self, index: usize) -> Option<u32> {
        if self.sample_size != 0 {
            (index < self.sample_count as usize).then_some(self.sample_size)
        } else {
            self.entry_sizes.get(index).copied()
        }
    }
}

impl std::fmt::Debug for StszBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StszBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("sample_size", &self.sample_size)
            .field("sample_count", &self.sample_count)
            .field("entry_sizes", &self.entry_sizes.iter().take(8).collect::<Vec<_>>())
            .finish()
    }
}

impl Mp4Box for StszBox {
    fn box_type(&self) -> [u8; 4] { *b"stsz" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let sample_size = payload.u32()?;
        let sample_count = payload.u32()?;

        let mut entry_sizes = Vec::new();
        if sample_size == 0 {
            payload.expect_records(sample_count, 4, "sample_count")?;
            entry_sizes.reserve(sample_count as usize);
            for _ in 0..sample_count {
                entry_sizes.push(payload.u32()?);
            }
        }

        Ok(StszBox {
            version,
            flags,
            sample_size,
            sample_count,
            entry_sizes,
            span: header.span(),
        })
    }
}
