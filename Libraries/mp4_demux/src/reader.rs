use std::io::{Cursor, Read, Seek, SeekFrom};
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::{debug, trace, warn};

use crate::{
    boxes::{
        co64::Co64Box, ctts::CttsBox, dinf::DinfBox, dref::DrefBox, edts::EdtsBox, elst::ElstBox,
        enums::Mp4BoxEnum, ftyp::FtypBox, generic::{Mp4Box, UnknownBox}, hdlr::HdlrBox,
        mdat::MdatBox, mdhd::MdhdBox, mdia::MdiaBox, meta::MetaBox, minf::MinfBox,
        moov::MoovBox, mvhd::MvhdBox, smhd::SmhdBox, stbl::StblBox, stco::StcoBox,
        stsc::StscBox, stsd::StsdBox, stss::StssBox, stsz::StszBox, stts::SttsBox,
        tkhd::TkhdBox, trak::TrakBox, udta::UdtaBox, vmhd::VmhdBox,
    },
    error::{Mp4Error, Result},
    format_fourcc,
};

/// Tag used in diagnostics for the implicit top-level range of a file.
pub const FILE_ROOT: [u8; 4] = *b"file";

/// Location and identity of one box inside its source. Produced by [`BoxIter`] and consumed
/// right away by the matching decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub box_type: [u8; 4],
    /// Total size including the header.
    pub size: u64,
    /// 8, or 16 when the box uses a 64-bit `largesize`.
    pub header_size: u64,
    /// Absolute position of the first header byte.
    pub start: u64,
}

impl BoxHeader {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn span(&self) -> Range<u64> {
        self.start..self.end()
    }

    pub fn payload_start(&self) -> u64 {
        self.start + self.header_size
    }

    pub fn payload_len(&self) -> u64 {
        self.size - self.header_size
    }

    /// Loads the payload (everything after the header) into memory.
    pub fn read_payload<R: Read + Seek>(&self, source: &mut R) -> Result<Vec<u8>> {
        let len = usize::try_from(self.payload_len())
            .map_err(|_| Mp4Error::malformed(self, "payload does not fit in memory"))?;
        self.read_from_start(source, len)
    }

    /// Reads at most the first `len` payload bytes, for boxes whose fixed fields are
    /// followed by child boxes.
    pub fn read_payload_prefix<R: Read + Seek>(&self, source: &mut R, len: u64) -> Result<Vec<u8>> {
        self.read_from_start(source, len.min(self.payload_len()) as usize)
    }

    fn read_from_start<R: Read + Seek>(&self, source: &mut R, len: usize) -> Result<Vec<u8>> {
        source.seek(SeekFrom::Start(self.payload_start()))?;
        let mut payload = vec![0u8; len];
        source.read_exact(&mut payload).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                Mp4Error::malformed(self, "payload extends past the end of the source")
            }
            _ => Mp4Error::Io(e),
        })?;
        Ok(payload)
    }

    /// Iterates the boxes nested in this box's payload.
    pub fn children<'r, R: Read + Seek>(&self, source: &'r mut R) -> BoxIter<'r, R> {
        self.children_after(source, 0)
    }

    /// Like [`BoxHeader::children`], skipping `prefix` payload bytes first (the version and
    /// flags of a full box such as `meta`).
    pub fn children_after<'r, R: Read + Seek>(&self, source: &'r mut R, prefix: u64) -> BoxIter<'r, R> {
        let start = (self.payload_start() + prefix).min(self.end());
        BoxIter::new(source, self.box_type, start, self.end() - start)
    }
}

impl std::fmt::Display for BoxHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` [{}..{}]", format_fourcc(&self.box_type), self.start, self.end())
    }
}

/// Lazy, single-pass sequence of the boxes found in `[start, start + length)`.
///
/// Each call to `next` seeks to the cursor, reads one header and advances by the declared
/// size, so the caller is free to use [`BoxIter::source`] between calls to decode the box
/// it was just handed. A header that does not fit the range yields one `MalformedBox`
/// error, after which the iterator is exhausted.
pub struct BoxIter<'r, R> {
    source: &'r mut R,
    parent: [u8; 4],
    position: u64,
    end: u64,
    failed: bool,
}

impl<'r, R: Read + Seek> BoxIter<'r, R> {
    pub fn new(source: &'r mut R, parent: [u8; 4], start: u64, length: u64) -> Self {
        BoxIter {
            source,
            parent,
            position: start,
            end: start + length,
            failed: false,
        }
    }

    pub fn source(&mut self) -> &mut R {
        self.source
    }

    /// True when exactly four zero bytes are left, the terminator QuickTime writes at the
    /// end of `udta`.
    pub fn at_zero_terminator(&mut self) -> Result<bool> {
        if self.failed || self.end.saturating_sub(self.position) != 4 {
            return Ok(false);
        }
        self.source.seek(SeekFrom::Start(self.position))?;
        Ok(self.source.read_u32::<BigEndian>()? == 0)
    }

    fn read_header(&mut self) -> Result<BoxHeader> {
        let start = self.position;
        let remaining = self.end - start;
        if remaining < 8 {
            return Err(Mp4Error::malformed_span(
                self.parent,
                &(start..self.end),
                format!("{} trailing bytes cannot hold a box header", remaining),
            ));
        }

        self.source.seek(SeekFrom::Start(start))?;
        let size32 = self.source.read_u32::<BigEndian>()?;
        let mut box_type = [0u8; 4];
        self.source.read_exact(&mut box_type)?;

        let (size, header_size) = match size32 {
            // Extends to the end of the enclosing range.
            0 => (remaining, 8),
            1 => {
                if remaining < 16 {
                    return Err(Mp4Error::malformed_span(
                        box_type,
                        &(start..self.end),
                        "64-bit size field does not fit in the enclosing range",
                    ));
                }
                (self.source.read_u64::<BigEndian>()?, 16)
            }
            n => (n as u64, 8),
        };

        if size < header_size {
            return Err(Mp4Error::malformed_span(
                box_type,
                &(start..start + header_size),
                format!("declared size {} is smaller than its {}-byte header", size, header_size),
            ));
        }
        if size > remaining {
            return Err(Mp4Error::malformed_span(
                box_type,
                &(start..start.saturating_add(size)),
                format!(
                    "declared size {} overruns the enclosing `{}` range by {} bytes",
                    size,
                    format_fourcc(&self.parent),
                    size - remaining
                ),
            ));
        }

        let header = BoxHeader { box_type, size, header_size, start };
        trace!("Box found: {}", header);
        Ok(header)
    }
}

impl<'r, R: Read + Seek> Iterator for BoxIter<'r, R> {
    type Item = Result<BoxHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.end {
            return None;
        }
        match self.read_header() {
            Ok(header) => {
                self.position = header.end();
                Some(Ok(header))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Big-endian cursor over a box payload. Every read past the end turns into a
/// `MalformedBox` error naming the box and its span.
pub struct PayloadReader<'a> {
    box_type: [u8; 4],
    span: Range<u64>,
    data: &'a [u8],
    cursor: Cursor<&'a [u8]>,
}

impl<'a> PayloadReader<'a> {
    pub fn new(header: &BoxHeader, data: &'a [u8]) -> Self {
        PayloadReader {
            box_type: header.box_type,
            span: header.span(),
            data,
            cursor: Cursor::new(data),
        }
    }

    pub fn error(&self, reason: impl Into<String>) -> Mp4Error {
        Mp4Error::malformed_span(self.box_type, &self.span, reason)
    }

    fn overrun(&self, wanted: usize) -> Mp4Error {
        self.error(format!(
            "read of {} bytes at payload offset {} runs past the {}-byte payload",
            wanted,
            self.cursor.position(),
            self.data.len()
        ))
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position())
    }

    fn need(&self, wanted: usize) -> Result<()> {
        if wanted > self.remaining() {
            return Err(self.overrun(wanted));
        }
        Ok(())
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    pub fn i16(&mut self) -> Result<i16> {
        self.need(2)?;
        Ok(self.cursor.read_i16::<BigEndian>()?)
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    pub fn i32(&mut self) -> Result<i32> {
        self.need(4)?;
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    pub fn u64(&mut self) -> Result<u64> {
        self.need(8)?;
        Ok(self.cursor.read_u64::<BigEndian>()?)
    }

    pub fn i64(&mut self) -> Result<i64> {
        self.need(8)?;
        Ok(self.cursor.read_i64::<BigEndian>()?)
    }

    pub fn fourcc(&mut self) -> Result<[u8; 4]> {
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(self.bytes(4)?);
        Ok(fourcc)
    }

    /// Version (1 byte) and flags (24 bits) of a full box.
    pub fn version_and_flags(&mut self) -> Result<(u8, u32)> {
        let version = self.u8()?;
        self.need(3)?;
        let flags = self.cursor.read_u24::<BigEndian>()?;
        Ok((version, flags))
    }

    /// Reads a time or duration field: 64 bits wide in version 1 boxes, 32 bits otherwise.
    pub fn versioned_u64(&mut self, version: u8) -> Result<u64> {
        match version {
            0 => Ok(self.u32()? as u64),
            1 => self.u64(),
            v => Err(self.error(format!("unsupported version {}", v))),
        }
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.need(len)?;
        let start = self.position();
        self.cursor.set_position((start + len) as u64);
        Ok(&self.data[start..start + len])
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.position().min(self.data.len());
        self.cursor.set_position(self.data.len() as u64);
        &self.data[start..]
    }

    /// Reads a table's `entry_count` and checks that exactly that many `entry_size`-byte
    /// records follow.
    pub fn entry_count(&mut self, entry_size: usize) -> Result<u32> {
        let count = self.u32()?;
        self.expect_records(count, entry_size, "entry_count")?;
        Ok(count)
    }

    pub fn expect_records(&self, count: u32, entry_size: usize, field: &str) -> Result<()> {
        let declared = count as u64 * entry_size as u64;
        if declared != self.remaining() as u64 {
            return Err(self.error(format!(
                "{} {} declares {} bytes of {}-byte records but {} bytes are present",
                field,
                count,
                declared,
                entry_size,
                self.remaining()
            )));
        }
        Ok(())
    }
}

/// Decodes the box described by `header`, picking the decoder by its type tag. Tags without
/// a decoder come back as [`Mp4BoxEnum::Unknown`] without their payload being read.
pub fn read_mp4_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Mp4BoxEnum> {
    match &header.box_type {
        b"co64" => Co64Box::read_box(source, header).map(Mp4BoxEnum::Co64),
        b"ctts" => CttsBox::read_box(source, header).map(Mp4BoxEnum::Ctts),
        b"dinf" => DinfBox::read_box(source, header).map(Mp4BoxEnum::Dinf),
        b"dref" => DrefBox::read_box(source, header).map(Mp4BoxEnum::Dref),
        b"edts" => EdtsBox::read_box(source, header).map(Mp4BoxEnum::Edts),
        b"elst" => ElstBox::read_box(source, header).map(Mp4BoxEnum::Elst),
        b"ftyp" => FtypBox::read_box(source, header).map(Mp4BoxEnum::Ftyp),
        b"hdlr" => HdlrBox::read_box(source, header).map(Mp4BoxEnum::Hdlr),
        b"mdat" => MdatBox::read_box(source, header).map(Mp4BoxEnum::Mdat),
        b"mdhd" => MdhdBox::read_box(source, header).map(Mp4BoxEnum::Mdhd),
        b"mdia" => MdiaBox::read_box(source, header).map(Mp4BoxEnum::Mdia),
        b"meta" => MetaBox::read_box(source, header).map(Mp4BoxEnum::Meta),
        b"minf" => MinfBox::read_box(source, header).map(Mp4BoxEnum::Minf),
        b"moov" => MoovBox::read_box(source, header).map(Mp4BoxEnum::Moov),
        b"mvhd" => MvhdBox::read_box(source, header).map(Mp4BoxEnum::Mvhd),
        b"smhd" => SmhdBox::read_box(source, header).map(Mp4BoxEnum::Smhd),
        b"stbl" => StblBox::read_box(source, header).map(Mp4BoxEnum::Stbl),
        b"stco" => StcoBox::read_box(source, header).map(Mp4BoxEnum::Stco),
        b"stsc" => StscBox::read_box(source, header).map(Mp4BoxEnum::Stsc),
        b"stsd" => StsdBox::read_box(source, header).map(Mp4BoxEnum::Stsd),
        b"stss" => StssBox::read_box(source, header).map(Mp4BoxEnum::Stss),
        b"stsz" => StszBox::read_box(source, header).map(Mp4BoxEnum::Stsz),
        b"stts" => SttsBox::read_box(source, header).map(Mp4BoxEnum::Stts),
        b"tkhd" => TkhdBox::read_box(source, header).map(Mp4BoxEnum::Tkhd),
        b"trak" => TrakBox::read_box(source, header).map(|b| Mp4BoxEnum::Trak(Box::new(b))),
        b"udta" => UdtaBox::read_box(source, header).map(Mp4BoxEnum::Udta),
        b"vmhd" => VmhdBox::read_box(source, header).map(Mp4BoxEnum::Vmhd),
        _ => UnknownBox::read_box(source, header).map(Mp4BoxEnum::Unknown),
    }
}

/// The top level of a progressive MP4 file.
#[derive(Debug, Clone)]
pub struct Mp4File {
    pub size: u64,
    pub ftyp: FtypBox,
    pub moov: MoovBox,
    /// Every `mdat` found at the top level, in file order.
    pub mdat: Vec<MdatBox>,
}

/// Walks the top-level boxes of `source` and decodes the metadata tree. `ftyp`, `moov` and
/// at least one `mdat` are required.
pub fn parse_mp4_file<R: Read + Seek>(source: &mut R) -> Result<Mp4File> {
    let size = source.seek(SeekFrom::End(0))?;
    debug!("Parsing {} bytes of MP4 data", size);

    let mut ftyp = None;
    let mut moov = None;
    let mut mdat = Vec::new();

    let mut boxes = BoxIter::new(source, FILE_ROOT, 0, size);
    while let Some(header) = boxes.next() {
        let header = header?;
        match read_mp4_box(boxes.source(), &header)? {
            Mp4BoxEnum::Ftyp(b) => ftyp = Some(b),
            Mp4BoxEnum::Moov(b) => {
                if moov.is_some() {
                    warn!("Ignoring additional moov box {}", header);
                } else {
                    moov = Some(b);
                }
            }
            Mp4BoxEnum::Mdat(b) => mdat.push(b),
            other => debug!("Unhandled top-level box: {}", format_fourcc(&other.box_type())),
        }
    }

    let ftyp = ftyp.ok_or_else(|| Mp4Error::missing(b"ftyp", "file"))?;
    let mut moov = moov.ok_or_else(|| Mp4Error::missing(b"moov", "file"))?;
    if mdat.is_empty() {
        return Err(Mp4Error::missing(b"mdat", "file"));
    }
    for trak in &mut moov.traks {
        trak.media_data = mdat.clone();
    }

    Ok(Mp4File { size, ftyp, moov, mdat })
}
