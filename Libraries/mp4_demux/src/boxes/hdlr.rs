use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::generic::Mp4Box;

// The `HdlrBox` struct represents a Handler Reference Box in the MP4 file format.
// Inside `mdia` it declares the kind of media a track carries; inside `meta` it declares
// the metadata format.
//
// Fields:
// - `handler_type`: `vide` for video, `soun` for audio, `mdir` for iTunes-style metadata, etc.
// - `name`: Human-readable handler name, with trailing NULs removed.
#[derive(Clone)]
pub struct HdlrBox { // Handler Reference Box
    pub version: u8,
    pub flags: u32,
    pub pre_defined: u32,
    pub handler_type: [u8; 4],
    pub name: String,
}

impl HdlrBox {
    pub fn is_video(&self) -> bool {
        &self.handler_type == b"vide"
    }
}

impl Default for HdlrBox {
    fn default() -> Self {
        HdlrBox {
            version: 0,
            flags: 0,
            pre_defined: 0,
            handler_type: *b"vide",
            name: "VideoHandler".to_string(),
        }
    }
}

impl std::fmt::Debug for HdlrBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdlrBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("handler_type", &format_fourcc(&self.handler_type))
            .field("name", &self.name)
            .finish()
    }
}

impl Mp4Box for HdlrBox {
    fn box_type(&self) -> [u8; 4] { *b"hdlr" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let pre_defined = payload.u32()?;
        let handler_type = payload.fourcc()?;
        payload.skip(12)?; // reserved
        // NUL-terminated, sometimes padded with more NULs.
        let name = String::from_utf8_lossy(payload.rest())
            .trim_end_matches('\0')
            .to_string();

        Ok(HdlrBox { version, flags, pre_defined, handler_type, name })
    }
}
