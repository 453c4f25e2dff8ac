use std::io::{Read, Seek};
use std::ops::Range;

use crate::{error::Result, format_fourcc, reader::BoxHeader};

use super::generic::Mp4Box;

// The `MdatBox` struct represents a Media Data Box in the MP4 file format.
// This box contains the raw media data, such as video frames or audio samples.
// Its payload is never loaded: samples are read straight from the source at the
// offsets computed from the sample tables.
//
// Fields:
// - `span`: Absolute position of the whole box, header included.
// - `payload_start`: Absolute position of the first media byte.
#[derive(Default, Clone)]
pub struct MdatBox { // Media Data Box
    pub span: Range<u64>,
    pub payload_start: u64,
}

impl MdatBox {
    pub fn payload(&self) -> Range<u64> {
        self.payload_start..self.span.end
    }

    /// True when the byte range `[offset, offset + len)` lies inside the payload.
    pub fn contains(&self, offset: u64, len: u64) -> bool {
        offset >= self.payload_start
            && offset.checked_add(len).map_or(false, |end| end <= self.span.end)
    }
}

impl std::fmt::Debug for MdatBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdatBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("span", &self.span)
            .field("payload_len", &(self.span.end - self.payload_start))
            .finish()
    }
}

impl Mp4Box for MdatBox {
    fn box_type(&self) -> [u8; 4] { *b"mdat" }

    fn read_box<R: Read + Seek>(_source: &mut R, header: &BoxHeader) -> Result<Self> {
        Ok(MdatBox {
            span: header.span(),
            payload_start: header.payload_start(),
        })
    }
}
