use std::io::{Read, Seek};
use std::ops::Range;

use tracing::debug;

use crate::{error::Result, format_fourcc, reader::BoxHeader};

// The `Mp4Box` trait defines the interface shared by every decoded MP4 box.
//
// Required Methods:
// - `box_type`: Returns the 4-byte type identifier of the box.
// - `read_box`: Decodes the box described by a header. Leaf boxes load their payload and
//   decode it with a `PayloadReader`; container boxes iterate their children with
//   `BoxHeader::children` and dispatch each one through `reader::read_mp4_box`.
pub trait Mp4Box {
    // Returns the 4-byte type identifier of the box.
    fn box_type(&self) -> [u8; 4];

    /// Reads the box located by `header` from `source`.
    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self>
    where
        Self: Sized;
}

// The `UnknownBox` struct represents a box that has no decoder. Only its position is
// kept; the payload is never read, so unknown boxes cost nothing no matter their size.
#[derive(Clone)]
pub struct UnknownBox {
    pub btype: [u8; 4],      // The type of the box (4 bytes)
    pub span: Range<u64>,    // Where the box sits in the source
}

impl Default for UnknownBox {
    fn default() -> Self {
        UnknownBox {
            btype: *b"xxxx",
            span: 0..0,
        }
    }
}

impl std::fmt::Debug for UnknownBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnknownBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("span", &self.span)
            .finish()
    }
}

impl Mp4Box for UnknownBox {
    fn box_type(&self) -> [u8; 4] {
        self.btype
    }

    fn read_box<R: Read + Seek>(_source: &mut R, header: &BoxHeader) -> Result<Self> {
        debug!("Skipping unhandled box {}", header);
        Ok(UnknownBox {
            btype: header.box_type,
            span: header.span(),
        })
    }
}
