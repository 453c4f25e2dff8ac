use std::io::{Read, Seek};

use tracing::debug;

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{
    enums::Mp4BoxEnum, generic::Mp4Box, hdlr::HdlrBox, mdhd::MdhdBox, minf::MinfBox,
};

// The `MdiaBox` struct represents a Media Box in the MP4 file format.
// This box is a container for all the media-specific information of a track:
// - `MdhdBox`: The media timescale and duration.
// - `HdlrBox`: The handler, which tells what kind of media the track carries.
// - `MinfBox`: The media information, including the sample table.
//
// All three are required.
#[derive(Default, Clone)]
pub struct MdiaBox { // Media Box
    pub mdhd: MdhdBox, // Media Header Box
    pub hdlr: HdlrBox, // Handler Reference Box
    pub minf: MinfBox, // Media Information Box
}

impl std::fmt::Debug for MdiaBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdiaBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("mdhd", &self.mdhd)
            .field("hdlr", &self.hdlr)
            .field("minf", &self.minf)
            .finish()
    }
}

impl Mp4Box for MdiaBox {
    fn box_type(&self) -> [u8; 4] { *b"mdia" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut mdhd = None;
        let mut hdlr = None;
        let mut minf = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Mdhd(b) => mdhd = Some(b),
                Mp4BoxEnum::Hdlr(b) => hdlr = Some(b),
                Mp4BoxEnum::Minf(b) => minf = Some(b),
                other => debug!("Ignoring {} inside mdia", format_fourcc(&other.box_type())),
            }
        }

        Ok(MdiaBox {
            mdhd: mdhd.ok_or_else(|| Mp4Error::missing(b"mdhd", "mdia"))?,
            hdlr: hdlr.ok_or_else(|| Mp4Error::missing(b"hdlr", "mdia"))?,
            minf: minf.ok_or_else(|| Mp4Error::missing(b"minf", "mdia"))?,
        })
    }
}
