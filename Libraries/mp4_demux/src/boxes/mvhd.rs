use std::io::{Read, Seek};

use crate::{error::Result, format_fourcc, reader::{BoxHeader, PayloadReader}};

use super::{
    fixed::{FixedPoint16, FixedPoint32, Matrix},
    generic::Mp4Box,
};

// The `MvhdBox` struct represents a Movie Header Box in the MP4 file format.
// This box contains global information about the movie, such as creation and modification times,
// the timescale, duration, playback rate, volume, and the next available track ID.
//
// Fields:
// - `version`: Version 0 stores times and duration in 32 bits, version 1 in 64 bits.
// - `timescale`: The number of time units per second for `duration`.
// - `duration`: Length of the longest track, in `timescale` units.
// - `rate`: Preferred playback rate, 1.0 is normal speed.
// - `volume`: Preferred playback volume, 1.0 is full volume.
// - `next_track_id`: The track ID a muxer would assign to the next track.
#[derive(Clone)]
pub struct MvhdBox { // Movie Header Box
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub rate: FixedPoint32,
    pub volume: FixedPoint16,
    pub matrix: Matrix,
    pub next_track_id: u32,
}

impl MvhdBox {
    /// Duration in seconds, or `None` when the timescale is zero.
    pub fn duration_seconds(&self) -> Option<f64> {
        (self.timescale != 0).then(|| self.duration as f64 / self.timescale as f64)
    }
}

impl Default for MvhdBox {
    fn default() -> Self {
        MvhdBox {
            version: 0,
            flags: 0,
            creation_time: 0,
            modification_time: 0,
            timescale: 1000,
            duration: 0,
            rate: FixedPoint32::ONE,
            volume: FixedPoint16::ONE,
            matrix: Matrix::IDENTITY,
            next_track_id: 2,
        }
    }
}

impl std::fmt::Debug for MvhdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MvhdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("creation_time", &self.creation_time)
            .field("modification_time", &self.modification_time)
            .field("timescale", &self.timescale)
            .field("duration", &self.duration)
            .field("rate", &self.rate)
            .field("volume", &self.volume)
            .field("matrix", &self.matrix)
            .field("next_track_id", &self.next_track_id)
            .finish()
    }
}

impl Mp4Box for MvhdBox {
    fn box_type(&self) -> [u8; 4] { *b"mvhd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let data = header.read_payload(source)?;
        let mut payload = PayloadReader::new(header, &data);

        let (version, flags) = payload.version_and_flags()?;
        let creation_time = payload.versioned_u64(version)?;
        let modification_time = payload.versioned_u64(version)?;
        let timescale = payload.u32()?;
        let duration = payload.versioned_u64(version)?;
        let rate = FixedPoint32(payload.u32()?);
        let volume = FixedPoint16(payload.i16()?);
        payload.skip(10)?; // reserved
        let matrix = Matrix::read(&mut payload)?;
        payload.skip(24)?; // pre_defined
        let next_track_id = payload.u32()?;

        Ok(MvhdBox {
            version,
            flags,
            creation_time,
            modification_time,
            timescale,
            duration,
            rate,
            volume,
            matrix,
            next_track_id,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reader::tests::{full_boxed, read_single};

    pub(crate) fn mvhd_body(timescale: u32, duration: u32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&[0; 8]); // creation, modification
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        body.extend_from_slice(&0x0100u16.to_be_bytes());
        body.extend_from_slice(&[0; 10]);
        for value in Matrix::IDENTITY.0 {
            body.extend_from_slice(&value.to_be_bytes());
        }
        body.extend_from_slice(&[0; 24]);
        body.extend_from_slice(&2u32.to_be_bytes());
        body
    }

    #[test]
    fn reads_version_0() {
        let mvhd: MvhdBox = read_single(&full_boxed(b"mvhd", 0, 0, &mvhd_body(600, 1200))).unwrap();
        assert_eq!(mvhd.timescale, 600);
        assert_eq!(mvhd.duration, 1200);
        assert_eq!(mvhd.duration_seconds(), Some(2.0));
        assert_eq!(mvhd.rate, FixedPoint32::ONE);
        assert!(mvhd.matrix.is_identity());
        assert_eq!(mvhd.next_track_id, 2);
    }

    #[test]
    fn reads_version_1_times() {
        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_be_bytes());
        body.extend_from_slice(&2u64.to_be_bytes());
        body.extend_from_slice(&90_000u32.to_be_bytes());
        body.extend_from_slice(&(u32::MAX as u64 + 10).to_be_bytes());
        // Rest of the version 0 layout after the timing fields.
        body.extend_from_slice(&mvhd_body(0, 0)[16..]);

        let mvhd: MvhdBox = read_single(&full_boxed(b"mvhd", 1, 0, &body)).unwrap();
        assert_eq!(mvhd.version, 1);
        assert_eq!(mvhd.modification_time, 2);
        assert_eq!(mvhd.duration, u32::MAX as u64 + 10);
        assert_eq!(mvhd.next_track_id, 2);
    }
}
