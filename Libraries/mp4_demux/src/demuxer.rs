use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, info};

use crate::{
    boxes::trak::TrakBox,
    error::{Mp4Error, Result},
    extract::ExtractPlan,
    format_fourcc,
    reader::{parse_mp4_file, Mp4File},
};

/// An open MP4 source together with its parsed metadata.
pub struct Demuxer<R> {
    source: R,
    file: Mp4File,
}

impl Demuxer<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening {}", path.display());
        Demuxer::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read + Seek> Demuxer<R> {
    /// Parses the box tree of `source`. Sample tables are indexed later, per track.
    pub fn new(mut source: R) -> Result<Self> {
        let file = parse_mp4_file(&mut source)?;
        info!(
            "Parsed `{}` file: {} tracks, {} media data boxes",
            format_fourcc(&file.ftyp.major_brand),
            file.moov.traks.len(),
            file.mdat.len()
        );
        for trak in &file.moov.traks {
            debug!(
                "Track {}: handler `{}`, timescale {}, {} samples",
                trak.track_id(),
                format_fourcc(&trak.mdia.hdlr.handler_type),
                trak.timescale(),
                trak.stbl().stsz.sample_count
            );
        }
        Ok(Demuxer { source, file })
    }

    pub fn file(&self) -> &Mp4File {
        &self.file
    }

    pub fn tracks(&self) -> &[TrakBox] {
        &self.file.moov.traks
    }

    /// H.264 video tracks, in file order.
    pub fn video_tracks(&self) -> impl Iterator<Item = &TrakBox> {
        self.tracks().iter().filter(|t| t.is_avc())
    }

    pub fn track(&self, track_id: u32) -> Result<&TrakBox> {
        self.file
            .moov
            .trak(track_id)
            .ok_or(Mp4Error::TrackNotFound(track_id))
    }

    /// The first H.264 video track.
    pub fn default_track(&self) -> Result<&TrakBox> {
        self.video_tracks().next().ok_or_else(|| Mp4Error::MissingRequiredBox {
            box_type: *b"avc1",
            parent: "moov",
        })
    }

    /// Extraction plan for `track_id`, or for the default track when `None`.
    pub fn plan(&self, track_id: Option<u32>) -> Result<ExtractPlan> {
        let trak = match track_id {
            Some(id) => self.track(id)?,
            None => self.default_track()?,
        };
        ExtractPlan::for_track(trak)
    }

    pub fn into_parts(self) -> (R, Mp4File) {
        (self.source, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::reader::tests::boxed;

    #[test]
    fn file_without_moov_is_rejected() {
        let mut data = boxed(b"ftyp", b"isom\0\0\0\0");
        data.extend(boxed(b"mdat", &[]));
        assert!(matches!(
            Demuxer::new(Cursor::new(data)),
            Err(Mp4Error::MissingRequiredBox { box_type, .. }) if &box_type == b"moov"
        ));
    }

    #[test]
    fn missing_file_is_io_failure() {
        assert!(matches!(Demuxer::open("/nonexistent/input.mp4"), Err(Mp4Error::Io(_))));
    }
}
