use std::io::{Read, Seek};

use tracing::debug;

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{elst::ElstBox, enums::Mp4BoxEnum, generic::Mp4Box};

// The `EdtsBox` struct represents an Edit Box (`edts`) in the MP4 file format.
// This box maps the media time-line to the presentation time-line. Its only child
// of interest is the Edit List Box.
#[derive(Default, Clone)]
pub struct EdtsBox { // Edit Box
    pub elst: Option<ElstBox>, // Optional Edit List Box
}

impl std::fmt::Debug for EdtsBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdtsBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("elst", &self.elst)
            .finish()
    }
}

impl Mp4Box for EdtsBox {
    fn box_type(&self) -> [u8; 4] { *b"edts" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut elst = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Elst(b) => {
                    if elst.is_some() {
                        return Err(Mp4Error::malformed(header, "duplicate elst box"));
                    }
                    elst = Some(b);
                }
                other => debug!("Ignoring {} inside edts", format_fourcc(&other.box_type())),
            }
        }

        Ok(EdtsBox { elst })
    }
}
