use std::io::{Read, Seek};

use tracing::debug;

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{dref::DrefBox, enums::Mp4BoxEnum, generic::Mp4Box};

// The `DinfBox` struct represents a Data Information Box in the MP4 file format.
// It is a container whose only required child is the Data Reference Box.
#[derive(Default, Clone)]
pub struct DinfBox { // Data Information Box
    pub dref: DrefBox,
}

impl std::fmt::Debug for DinfBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DinfBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("dref", &self.dref)
            .finish()
    }
}

impl Mp4Box for DinfBox {
    fn box_type(&self) -> [u8; 4] { *b"dinf" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut dref = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Dref(b) => dref = Some(b),
                other => debug!("Ignoring {} inside dinf", format_fourcc(&other.box_type())),
            }
        }

        let dref = dref.ok_or_else(|| Mp4Error::missing(b"dref", "dinf"))?;
        Ok(DinfBox { dref })
    }
}
