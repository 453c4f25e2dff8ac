use std::io::{Read, Seek};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    avcc::CodecConfig,
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
    sample_table::SampleIndex,
};

use super::{
    edts::EdtsBox, enums::Mp4BoxEnum, generic::Mp4Box, mdat::MdatBox, mdia::MdiaBox,
    meta::MetaBox, stbl::StblBox, tkhd::TkhdBox,
};

// The `TrakBox` struct represents a Track Box in the MP4 file format.
// This box is a container for all the information related to a single track in the movie.
//
// Fields:
// - `tkhd`: The Track Header Box, with the track ID and presentation size.
// - `edts`: (Optional) The Edit Box specifying edit lists.
// - `meta`: (Optional) Metadata specific to the track.
// - `mdia`: The Media Box, down to the sample table.
// - `media_data`: The `mdat` boxes of the file, which every sample must fall inside.
//
// The flattened sample index and the decoded codec configuration are derived from the
// tables on first use and cached on the track.
#[derive(Default, Clone)]
pub struct TrakBox { // Track Box
    pub tkhd: TkhdBox, // Track Header Box
    pub edts: Option<EdtsBox>, // Optional Edit Box
    pub meta: Option<MetaBox>, // Optional Metadata Box
    pub mdia: MdiaBox, // Media Box
    pub media_data: Vec<MdatBox>, // Set by `parse_mp4_file`
    index: OnceCell<SampleIndex>,
    codec: OnceCell<CodecConfig>,
}

impl TrakBox {
    pub fn new(tkhd: TkhdBox, mdia: MdiaBox) -> Self {
        TrakBox { tkhd, mdia, ..Default::default() }
    }

    pub fn track_id(&self) -> u32 {
        self.tkhd.track_id
    }

    pub fn stbl(&self) -> &StblBox {
        &self.mdia.minf.stbl
    }

    pub fn timescale(&self) -> u32 {
        self.mdia.mdhd.timescale
    }

    pub fn is_video(&self) -> bool {
        self.mdia.hdlr.is_video()
    }

    /// A video track whose first sample entry is `avc1` or `avc3`.
    pub fn is_avc(&self) -> bool {
        self.is_video() && self.stbl().stsd.entries.first().map_or(false, |e| e.is_avc())
    }

    /// The per-sample index built from the sample tables, computed once.
    pub fn sample_index(&self) -> Result<&SampleIndex> {
        self.index.get_or_try_init(|| {
            debug!("Building sample index for track {}", self.track_id());
            SampleIndex::build(self.stbl(), &self.media_data)
        })
    }

    /// The H.264 decoder configuration from the `avcC` box, computed once.
    pub fn codec_config(&self) -> Result<&CodecConfig> {
        self.codec.get_or_try_init(|| {
            if let Some(problem) = &self.stbl().unreadable {
                return Err(problem.to_error());
            }
            CodecConfig::from_sample_description(&self.stbl().stsd, self.track_id())
        })
    }
}

impl std::fmt::Debug for TrakBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrakBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("tkhd", &self.tkhd)
            .field("edts", &self.edts)
            .field("meta", &self.meta)
            .field("mdia", &self.mdia)
            .field("media_data", &self.media_data)
            .finish()
    }
}

impl Mp4Box for TrakBox {
    fn box_type(&self) -> [u8; 4] { *b"trak" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut tkhd = None;
        let mut edts = None;
        let mut meta = None;
        let mut mdia = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            if &child.box_type == b"meta" {
                match MetaBox::read_box(children.source(), &child) {
                    Ok(b) => meta = Some(b),
                    Err(Mp4Error::Io(e)) => return Err(Mp4Error::Io(e)),
                    Err(e) => warn!("Ignoring unreadable track metadata: {}", e),
                }
                continue;
            }
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Tkhd(b) => tkhd = Some(b),
                Mp4BoxEnum::Edts(b) => edts = Some(b),
                Mp4BoxEnum::Mdia(b) => {
                    if mdia.is_some() {
                        return Err(Mp4Error::malformed(header, "duplicate mdia box"));
                    }
                    mdia = Some(b);
                }
                other => debug!("Ignoring {} inside trak", format_fourcc(&other.box_type())),
            }
        }

        let mut trak = TrakBox::new(
            tkhd.ok_or_else(|| Mp4Error::missing(b"tkhd", "trak"))?,
            mdia.ok_or_else(|| Mp4Error::missing(b"mdia", "trak"))?,
        );
        trak.edts = edts;
        trak.meta = meta;
        Ok(trak)
    }
}
