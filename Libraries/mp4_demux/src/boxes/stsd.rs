use std::io::{Read, Seek};
use std::ops::Range;

use crate::{
    error::{Mp4Error, Result},
    format_capped_bytes, format_fourcc,
    reader::{BoxHeader, PayloadReader},
};

use super::generic::Mp4Box;

/// Length of the fixed part of a visual sample entry payload. Codec configuration boxes
/// such as `avcC` follow it.
pub const VISUAL_SAMPLE_ENTRY_LEN: usize = 78;

// The `StsdBox` struct represents a Sample Description Box in the MP4 file format.
// This box contains a table of sample descriptions, which describe the format and properties of the media samples.
// Each entry is kept as its raw payload; the codec-specific decoding (see `avcc`) happens
// only for the track being extracted.
#[derive(Default, Clone)]
pub struct StsdBox { // Sample Description Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SampleEntry>,  // Typically 1 entry
    pub span: Range<u64>,
}

// One sample entry box: its format tag (`avc1`, `mp4a`, ...) and undecoded payload.
//
// Fields:
// - `format`: The sample entry box type, which names the codec.
// - `span`: Absolute position of the entry box.
// - `payload_start`: Absolute position of `data[0]`.
// - `data`: Everything after the entry's box header.
#[derive(Default, Clone)]
pub struct SampleEntry {
    pub format: [u8; 4],
    pub span: Range<u64>,
    pub payload_start: u64,
    pub data: Vec<u8>,
}

// The fixed fields of a visual sample entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSampleEntry {
    pub data_reference_index: u16,
    pub width: u16,
    pub height: u16,
    pub compressor_name: String,  // Up to 31 bytes
    pub depth: u16,
}

impl SampleEntry {
    pub fn is_avc(&self) -> bool {
        &self.format == b"avc1" || &self.format == b"avc3"
    }

    /// Decodes the fixed part of a visual sample entry.
    pub fn visual(&self) -> Result<VisualSampleEntry> {
        let header = BoxHeader {
            box_type: self.format,
            size: self.span.end - self.span.start,
            header_size: self.payload_start - self.span.start,
            start: self.span.start,
        };
        let mut payload = PayloadReader::new(&header, &self.data);

        payload.skip(6)?; // reserved
        let data_reference_index = payload.u16()?;
        payload.skip(16)?; // pre_defined + reserved
        let width = payload.u16()?;
        let height = payload.u16()?;
        payload.skip(14)?; // resolutions, reserved, frame_count
        // Pascal string in a fixed 32-byte field.
        let name_field = payload.bytes(32)?;
        let name_len = (name_field[0] as usize).min(31);
        let compressor_name = String::from_utf8_lossy(&name_field[1..1 + name_len]).to_string();
        let depth = payload.u16()?;

        Ok(VisualSampleEntry {
            data_reference_index,
            width,
            height,
            compressor_name,
            depth,
        })
    }

    /// Bytes following the fixed visual sample entry fields, or `None` when the entry is
    /// too short to be a visual sample entry.
    pub fn visual_extensions(&self) -> Option<&[u8]> {
        self.data.get(VISUAL_SAMPLE_ENTRY_LEN..)
    }
}

impl std::fmt::Debug for StsdBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsdBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("descriptions", &self.entries)
            .finish()
    }
}

impl std::fmt::Debug for SampleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleEntry")
            .field("format", &format_fourcc(&self.format))
            .field("span", &self.span)
            .field("data", &format_capped_bytes(&self.data))
            .finish()
    }
}

impl Mp4Box for StsdBox {
    fn box_type(&self) -> [u8; 4] { *b"stsd" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        // Version, flags and entry_count; the entries are read as child boxes.
        let data = header.read_payload_prefix(source, 8)?;
        let mut payload = PayloadReader::new(header, &data);
        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.u32()?;

        let mut entries = Vec::new();
        let mut children = header.children_after(source, 8);
        while let Some(child) = children.next() {
            let child = child?;
            let data = child.read_payload(children.source())?;
            entries.push(SampleEntry {
                format: child.box_type,
                span: child.span(),
                payload_start: child.payload_start(),
                data,
            });
        }

        if entries.len() != entry_count as usize {
            return Err(Mp4Error::malformed(
                header,
                format!("entry_count {} but {} sample entries present", entry_count, entries.len()),
            ));
        }

        Ok(StsdBox { version, flags, entries, span: header.span() })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    use crate::reader::{tests::{boxed, full_boxed, read_single}, BoxIter, FILE_ROOT};

    /// Counts the bytes handed out by the wrapped cursor.
    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        read: usize,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.read += n;
            Ok(n)
        }
    }

    impl Seek for CountingReader {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    /// A visual sample entry of `format` followed by `extensions` (already boxed).
    pub(crate) fn visual_entry(format: &[u8; 4], width: u16, height: u16, extensions: &[u8]) -> Vec<u8> {
        let mut body = vec![0; 6];
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&[0; 16]);
        body.extend_from_slice(&width.to_be_bytes());
        body.extend_from_slice(&height.to_be_bytes());
        body.extend_from_slice(&0x0048_0000u32.to_be_bytes());
        body.extend_from_slice(&0x0048_0000u32.to_be_bytes());
        body.extend_from_slice(&[0; 4]);
        body.extend_from_slice(&1u16.to_be_bytes());
        let mut name = vec![4u8];
        name.extend_from_slice(b"x264");
        name.resize(32, 0);
        body.extend_from_slice(&name);
        body.extend_from_slice(&0x0018u16.to_be_bytes());
        body.extend_from_slice(&0xFFFFu16.to_be_bytes());
        body.extend_from_slice(extensions);
        boxed(format, &body)
    }

    pub(crate) fn stsd_with(entries: &[Vec<u8>]) -> Vec<u8> {
        let mut body = (entries.len() as u32).to_be_bytes().to_vec();
        for entry in entries {
            body.extend_from_slice(entry);
        }
        full_boxed(b"stsd", 0, 0, &body)
    }

    #[test]
    fn keeps_entries_with_positions() {
        let stsd: StsdBox = read_single(&stsd_with(&[visual_entry(b"avc1", 320, 240, &[])])).unwrap();
        assert_eq!(stsd.entries.len(), 1);
        let entry = &stsd.entries[0];
        assert!(entry.is_avc());
        assert_eq!(entry.span, 16..(16 + 8 + VISUAL_SAMPLE_ENTRY_LEN as u64));
        assert_eq!(entry.payload_start, 24);
        assert_eq!(entry.visual_extensions(), Some(&[][..]));

        let visual = entry.visual().unwrap();
        assert_eq!((visual.width, visual.height), (320, 240));
        assert_eq!(visual.compressor_name, "x264");
        assert_eq!(visual.depth, 24);
    }

    #[test]
    fn entry_count_mismatch_is_malformed() {
        let mut bytes = stsd_with(&[visual_entry(b"avc1", 16, 16, &[])]);
        // Bump entry_count to 2.
        bytes[15] = 2;
        let result = read_single::<StsdBox>(&bytes);
        assert!(matches!(result, Err(Mp4Error::MalformedBox { box_type, .. }) if &box_type == b"stsd"));
    }

    #[test]
    fn entries_are_read_once() {
        let padding = boxed(b"free", &[0; 4000]);
        let entry = visual_entry(b"avc1", 16, 16, &padding);
        let bytes = stsd_with(&[entry.clone()]);
        let mut source = CountingReader { inner: Cursor::new(bytes.clone()), read: 0 };
        let header = BoxIter::new(&mut source, FILE_ROOT, 0, bytes.len() as u64)
            .next()
            .unwrap()
            .unwrap();
        source.read = 0;

        let stsd = StsdBox::read_box(&mut source, &header).unwrap();
        assert_eq!(stsd.entries[0].data.len(), entry.len() - 8);
        // Version, flags and entry_count, then the entry header and its payload.
        assert_eq!(source.read, 8 + entry.len());
    }
}
