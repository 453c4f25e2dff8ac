use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::{
    fixed::{FixedPoint16, FixedPoint32, Matrix},
    generic::Mp4Box,
};

pub const TRACK_ENABLED: u32 = 0x000001;
pub const TRACK_IN_MOVIE: u32 = 0x000002;
pub const TRACK_IN_PREVIEW: u32 = 0x000004;

// The `TkhdBox` struct represents a Track Header Box in the MP4 file format.
// This box contains metadata about a specific track, such as its creation and modification times,
// track ID, duration, dimensions, and flags indicating its state (e.g., enabled, in movie, in preview).
//
// Fields:
// - `track_id`: The unique ID of the track within the movie, never 0.
// - `duration`: Duration of the track in movie (`mvhd`) timescale units.
// - `width`, `height`: Presentation size in pixels, 16.16 fixed-point.
// - `flags`: `TRACK_ENABLED`, `TRACK_IN_MOVIE` and `TRACK_IN_PREVIEW` bits.
#[derive(Clone)]
pub struct TkhdBox { // Track Header Box
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: FixedPoint16,     // 0 for video tracks
    pub matrix: Matrix,
    pub width: FixedPoint32,
    pub height: FixedPoint32,
}

impl TkhdBox {
    pub fn is_enabled(&self) -> bool {
        self.flags & TRACK_ENABLED != 0
    }
}

impl Default for TkhdBox {
    fn default() -> Self {
        TkhdBox {
            version: 0,
            flags: TRACK_ENABLED | TRACK_IN_MOVIE | TRACK_IN_PREVIEW,
            creation_time: 0,
            modification_time: 0,
            track_id: 1,
            duration: 0,
            layer: 0,
            alternate_group: 0,
            volume: FixedPoint16(0),
            matrix: Matrix::IDENTITY,
            width: FixedPoint32(0),
            height: FixedPoint32(0),
        }
    }
}

impl std::fmt::Debug for TkhdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TkhdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &format!("0x{:06X}", self.flags))
            .field("track_id", &self.track_id)
            .field("duration", &self.duration)
            .field("layer", &self.layer)
            .field("alternate_group", &self.alternate_group)
            .field("volume", &self.volume)
            .field("matrix", &self.matrix)
            .field("width", &format!("{} px", self.width.integer()))
            .field("height", &format!("{} px", self.height.integer()))
            .finish()
    }
}

impl Mp4Box for TkhdBox {
    fn box_type(&self) -> [u8; 4] { *b"tkhd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let creation_time = payload.versioned_u64(version)?;
        let modification_time = payload.versioned_u64(version)?;
        let track_id = payload.u32()?;
        payload.skip(4)?; // reserved
        let duration = payload.versioned_u64(version)?;
        payload.skip(8)?; // reserved
        let layer = payload.i16()?;
        let alternate_group = payload.i16()?;
        let volume = FixedPoint16(payload.i16()?);
        payload.skip(2)?; // reserved
        let matrix = Matrix::read(&mut payload)?;
        let width = FixedPoint32(payload.u32()?);
        let height = FixedPoint32(payload.u32()?);

        if track_id == 0 {
            return Err(payload.error("track_id 0 is reserved"));
        }

        Ok(TkhdBox {
            version,
            flags,
            creation_time,
            modification_time,
            track_id,
            duration,
            layer,
            alternate_group,
            volume,
            matrix,
            width,
            height,
        })
    }
}
