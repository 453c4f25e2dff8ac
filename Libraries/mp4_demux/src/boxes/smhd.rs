use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::{fixed::FixedPoint16, generic::Mp4Box};

// Sound Media Header Box. Only present in audio tracks, which the demuxer lists but
// never extracts.
#[derive(Default, Clone)]
pub struct SmhdBox {
    pub version: u8,
    pub flags: u32,
    pub balance: FixedPoint16, // 0 is center, -1.0 full left
}

impl std::fmt::Debug for SmhdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmhdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("balance", &self.balance)
            .finish()
    }
}

impl Mp4Box for SmhdBox {
    fn box_type(&self) -> [u8; 4] { *b"smhd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let balance = FixedPoint16(payload.i16()?);
        payload.skip(2)?; // reserved

        Ok(SmhdBox { version, flags, balance })
    }
}
