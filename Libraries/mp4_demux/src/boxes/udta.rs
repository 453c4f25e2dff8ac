use std::io::{Read, Seek};

use tracing::{debug, warn};

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{read_mp4_box, BoxHeader},
};

use super::{enums::Mp4BoxEnum, generic::Mp4Box, meta::MetaBox};

/// The `UdtaBox` represents the User Data Box in the MP4 file format.
/// It typically contains user-specific data, often including a `MetaBox`.
///
/// User data is informational only. Content that cannot be decoded is skipped with a
/// warning, and the 32-bit zero terminator written by QuickTime is accepted.
#[derive(Default, Clone)]
pub struct UdtaBox {
    pub meta: Option<MetaBox>,  // Optional MetaBox inside UdtaBox
}

impl std::fmt::Debug for UdtaBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dbg = f.debug_struct("UdtaBox");
        dbg.field("box_type", &format_fourcc(&self.box_type()));
        if self.meta.is_some() {
            dbg.field("meta", &"Present");
        } else {
            dbg.field("meta", &"None");
        }
        dbg.finish()
    }
}

impl Mp4Box for UdtaBox {
    fn box_type(&self) -> [u8; 4] { *b"udta" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut meta = None;

        let mut children = header.children(source);
        loop {
            if children.at_zero_terminator()? {
                debug!("udta ends with a zero terminator");
                break;
            }
            let child = match children.next() {
                Some(Ok(child)) => child,
                Some(Err(Mp4Error::Io(e))) => return Err(Mp4Error::Io(e)),
                Some(Err(e)) => {
                    warn!("Ignoring the rest of udta: {}", e);
                    break;
                }
                None => break,
            };
            match read_mp4_box(children.source(), &child) {
                Ok(Mp4BoxEnum::Meta(b)) => meta = Some(b),
                // ©nam, ©too and friends
                Ok(other) => debug!("Ignoring {} inside udta", format_fourcc(&other.box_type())),
                Err(Mp4Error::Io(e)) => return Err(Mp4Error::Io(e)),
                Err(e) => warn!("Ignoring unreadable {} inside udta: {}", child, e),
            }
        }

        Ok(UdtaBox { meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        boxes::hdlr::tests::hdlr_body,
        reader::tests::{boxed, full_boxed, read_single},
    };

    fn hdlr_mdir() -> Vec<u8> {
        full_boxed(b"hdlr", 0, 0, &hdlr_body(b"mdir", ""))
    }

    #[test]
    fn accepts_zero_terminator() {
        let mut children = boxed(b"free", &[1, 2, 3]);
        children.extend(full_boxed(b"meta", 0, 0, &hdlr_mdir()));
        children.extend_from_slice(&[0, 0, 0, 0]);
        let udta: UdtaBox = read_single(&boxed(b"udta", &children)).unwrap();
        assert!(udta.meta.is_some());
    }

    #[test]
    fn unreadable_content_is_skipped() {
        let mut children = full_boxed(b"meta", 0, 0, &hdlr_mdir());
        // A child declaring more bytes than udta holds.
        children.extend_from_slice(&64u32.to_be_bytes());
        children.extend_from_slice(b"\xA9nam");
        children.extend_from_slice(b"title");
        let udta: UdtaBox = read_single(&boxed(b"udta", &children)).unwrap();
        assert!(udta.meta.is_some());
    }
}
