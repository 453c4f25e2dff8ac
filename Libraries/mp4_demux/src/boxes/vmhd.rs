use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `VmhdBox` struct represents a Video Media Header Box in the MP4 file format.
// It holds the composition mode and the color used by it. Flags are normally 1.
#[derive(Clone)]
pub struct VmhdBox { // Video Media Header Box
    pub version: u8,
    pub flags: u32,
    pub graphics_mode: u16,  // 0 = copy
    pub opcolor: [u16; 3],   // RGB
}

impl Default for VmhdBox {
    fn default() -> Self {
        VmhdBox {
            version: 0,
            flags: 1,
            graphics_mode: 0,
            opcolor: [0, 0, 0],
        }
    }
}

impl std::fmt::Debug for VmhdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmhdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("graphics_mode", &self.graphics_mode)
            .field("opcolor", &self.opcolor)
            .finish()
    }
}

impl Mp4Box for VmhdBox {
    fn box_type(&self) -> [u8; 4] { *b"vmhd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let graphics_mode = payload.u16()?;
        let opcolor = [payload.u16()?, payload.u16()?, payload.u16()?];

        Ok(VmhdBox { version, flags, graphics_mode, opcolor })
    }
}
