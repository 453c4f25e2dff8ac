use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::{
    error::Result,
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{enums::Mp4BoxEnum, generic::Mp4Box, hdlr::HdlrBox};

/// The `MetaBox` represents metadata information in the MP4 file.
/// Only the handler is decoded; item and tag boxes are skipped.
///
/// ISO files make `meta` a full box, QuickTime files don't. The two are told apart by
/// looking for a `hdlr` tag where the first child's type would sit.
#[derive(Default, Clone)]
pub struct MetaBox {
    pub version: u8,
    pub flags: u32,
    pub hdlr: Option<HdlrBox>,  // Handler Box inside Meta
}

impl std::fmt::Debug for MetaBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("hdlr", &self.hdlr)
            .finish()
    }
}

impl Mp4Box for MetaBox {
    fn box_type(&self) -> [u8; 4] { *b"meta" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut prefix = [0u8; 8];
        let mut version = 0;
        let mut flags = 0;
        let mut skip = 0;
        if header.payload_len() >= 8 {
            source.seek(SeekFrom::Start(header.payload_start()))?;
            source.read_exact(&mut prefix)?;
            if &prefix[4..8] != b"hdlr" {
                version = prefix[0];
                flags = u32::from_be_bytes([0, prefix[1], prefix[2], prefix[3]]);
                skip = 4;
            }
        }

        let mut hdlr = None;
        let mut children = header.children_after(source, skip);
        while let Some(child) = children.next() {
            let child = child?;
            match read_mp4_box(children.source(), &child)? {
                Mp4BoxEnum::Hdlr(b) => hdlr = Some(b),
                other => debug!("Ignoring {} inside meta", format_fourcc(&other.box_type())),
            }
        }

        Ok(MetaBox { version, flags, hdlr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        boxes::hdlr::tests::hdlr_body,
        reader::tests::{boxed, full_boxed, read_single},
    };

    #[test]
    fn reads_iso_full_box_layout() {
        let mut body = full_boxed(b"hdlr", 0, 0, &hdlr_body(b"mdir", ""));
        body.extend(boxed(b"ilst", &[]));
        let meta: MetaBox = read_single(&full_boxed(b"meta", 0, 0, &body)).unwrap();
        assert_eq!(&meta.hdlr.unwrap().handler_type, b"mdir");
    }

    #[test]
    fn reads_quicktime_layout_without_version() {
        let body = full_boxed(b"hdlr", 0, 0, &hdlr_body(b"mdta", ""));
        let meta: MetaBox = read_single(&boxed(b"meta", &body)).unwrap();
        assert_eq!(&meta.hdlr.unwrap().handler_type, b"mdta");
    }
}
