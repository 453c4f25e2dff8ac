use std::io::{Read, Seek};

use tracing::debug;

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{
    dinf::DinfBox, enums::Mp4BoxEnum, generic::Mp4Box, smhd::SmhdBox, stbl::StblBox,
    vmhd::VmhdBox,
};

// The `MinfBox` struct represents a Media Information Box in the MP4 file format.
// It holds the media-type specific header (`vmhd` for video, `smhd` for audio), the data
// references and the sample table. Only the sample table is required.
#[derive(Default, Clone)]
pub struct MinfBox { // Media Information Box
    pub vmhd: Option<VmhdBox>, // Video Media Header Box
    pub smhd: Option<SmhdBox>, // Sound Media Header Box
    pub dinf: Option<DinfBox>, // Data Information Box
    pub stbl: StblBox,         // Sample Table Box
}

impl std::fmt::Debug for MinfBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinfBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("vmhd", &self.vmhd)
            .field("smhd", &self.smhd)
            .field("dinf", &self.dinf)
            .field("stbl", &self.stbl)
            .finish()
    }
}

impl Mp4Box for MinfBox {
    fn box_type(&self) -> [u8; 4] { *b"minf" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut vmhd = None;
        let mut smhd = None;
        let mut dinf = None;
        let mut stbl = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Vmhd(b) => vmhd = Some(b),
                Mp4BoxEnum::Smhd(b) => smhd = Some(b),
                Mp4BoxEnum::Dinf(b) => dinf = Some(b),
                Mp4BoxEnum::Stbl(b) => {
                    if stbl.is_some() {
                        return Err(Mp4Error::malformed(header, "duplicate stbl box"));
                    }
                    stbl = Some(b);
                }
                other => debug!("Ignoring {} inside minf", format_fourcc(&other.box_type())),
            }
        }

        let stbl = stbl.ok_or_else(|| Mp4Error::missing(b"stbl", "minf"))?;
        Ok(MinfBox { vmhd, smhd, dinf, stbl })
    }
}
