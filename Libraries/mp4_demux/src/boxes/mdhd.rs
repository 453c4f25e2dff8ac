use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::{fixed::Language, generic::Mp4Box};

// The `MdhdBox` struct represents a Media Header Box in the MP4 file format.
// It carries the media timescale, which is the unit of every timestamp found in the
// track's sample tables, plus the media duration and language.
#[derive(Clone)]
pub struct MdhdBox { // Media Header Box
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: Language,
}

impl Default for MdhdBox {
    fn default() -> Self {
        MdhdBox {
            version: 0,
            flags: 0,
            creation_time: 0,
            modification_time: 0,
            timescale: 90_000,
            duration: 0,
            language: Language::UNDETERMINED,
        }
    }
}

impl std::fmt::Debug for MdhdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MdhdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("timescale", &self.timescale)
            .field("duration", &self.duration)
            .field("language", &self.language)
            .finish()
    }
}

impl Mp4Box for MdhdBox {
    fn box_type(&self) -> [u8; 4] { *b"mdhd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let creation_time = payload.versioned_u64(version)?;
        let modification_time = payload.versioned_u64(version)?;
        let timescale = payload.u32()?;
        let duration = payload.versioned_u64(version)?;
        // 1 pad bit, then three 5-bit letters.
        let language = Language(payload.u16()? & 0x7FFF);
        payload.skip(2)?; // pre_defined

        Ok(MdhdBox {
            version,
            flags,
            creation_time,
            modification_time,
            timescale,
            duration,
            language,
        })
    }
}
