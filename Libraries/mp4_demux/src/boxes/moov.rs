use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{
    enums::Mp4BoxEnum, generic::Mp4Box, meta::MetaBox, mvhd::MvhdBox, trak::TrakBox,
    udta::UdtaBox,
};

// The `MoovBox` struct represents a Movie Box in the MP4 file format.
// This box is a container for all the metadata related to the entire movie.
// It contains the following fields:
// - `mvhd`: The Movie Header Box, with the movie timescale and duration.
// - `traks`: Every Track Box, in file order.
// - `meta`, `udta`: Optional movie-level metadata.
//
// Fragmented files (with `mvex`) are read as far as their initial tracks go; the
// fragments themselves are not indexed.
//
// A track, `meta` or `udta` that fails to decode is skipped with a warning, so one
// damaged track does not hide the others. I/O failures still abort.
#[derive(Default, Clone)]
pub struct MoovBox { // Movie Box
    pub mvhd: MvhdBox,             // Movie Header Box (mandatory)
    pub traks: Vec<TrakBox>,       // Zero or more Track Boxes
    pub meta: Option<MetaBox>,     // Metadata Box (optional)
    pub udta: Option<UdtaBox>,     // User Data Box (optional)
}

impl MoovBox {
    pub fn trak(&self, track_id: u32) -> Option<&TrakBox> {
        self.traks.iter().find(|t| t.track_id() == track_id)
    }
}

impl std::fmt::Debug for MoovBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("MoovBox");
        dbg.field("box_type", &format_fourcc(&self.box_type()))
           .field("mvhd", &self.mvhd)
           .field("traks", &self.traks);
        if self.meta.is_some() { dbg.field("meta", &self.meta); }
        if self.udta.is_some() { dbg.field("udta", &self.udta); }
        dbg.finish()
    }
}

impl Mp4Box for MoovBox {
    fn box_type(&self) -> [u8; 4] { *b"moov" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut mvhd = None;
        let mut traks: Vec<TrakBox> = Vec::new();
        let mut meta = None;
        let mut udta = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            if &child.box_type == b"mvex" {
                warn!("Movie fragments are not supported, only the initial samples are indexed");
                continue;
            }
            let source = children.source();
            match &child.box_type {
                b"trak" => {
                    let Some(trak) = skip_unreadable(TrakBox::read_box(source, &child), &child)? else {
                        continue;
                    };
                    if traks.iter().any(|t| t.track_id() == trak.track_id()) {
                        return Err(Mp4Error::malformed(
                            &child,
                            format!("duplicate track_id {}", trak.track_id()),
                        ));
                    }
                    traks.push(trak);
                }
                b"meta" => meta = skip_unreadable(MetaBox::read_box(source, &child), &child)?,
                b"udta" => udta = skip_unreadable(UdtaBox::read_box(source, &child), &child)?,
                _ => match read_mp4_box(source, &child)? {
                    Mp4BoxEnum::Mvhd(b) => mvhd = Some(b),
                    other => debug!("Ignoring {} inside moov", format_fourcc(&other.box_type())),
                },
            }
        }

        let mvhd = mvhd.ok_or_else(|| Mp4Error::missing(b"mvhd", "moov"))?;
        debug!("moov: {} tracks, timescale {}", traks.len(), mvhd.timescale);
        Ok(MoovBox { mvhd, traks, meta, udta })
    }
}

fn skip_unreadable<T>(result: Result<T>, header: &BoxHeader) -> Result<Option<T>> {
    match result {
        Ok(b) => Ok(Some(b)),
        Err(Mp4Error::Io(e)) => Err(Mp4Error::Io(e)),
        Err(e) => {
            warn!("Skipping unreadable {}: {}", header, e);
            Ok(None)
        }
    }
}
