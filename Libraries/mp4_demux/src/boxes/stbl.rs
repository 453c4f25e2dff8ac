use std::io::{Read, Seek};
use std::ops::Range;

use tracing::{debug, warn};

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::BoxHeader,
};

use super::{
    co64::Co64Box, ctts::CttsBox, generic::Mp4Box, stco::StcoBox,
    stsc::StscBox, stsd::StsdBox, stss::StssBox, stsz::StszBox, stts::SttsBox,
};

// The `StblBox` struct represents a Sample Table Box in the MP4 file format.
// This box is a container for all the time and data indexing of the media samples in a track.
//
// Required children: `stsd`, `stts`, `stsc`, `stsz` and one of `stco`/`co64`. When one
// is missing or malformed the first such problem is kept in `unreadable` and the other
// tracks of the file are unaffected.
// Optional children: `ctts` and `stss`. A malformed optional table is dropped with a
// warning instead of failing the whole track.
#[derive(Default, Clone)]
pub struct StblBox { // Sample Table Box
    pub stsd: StsdBox,         // Sample Description Box
    pub stts: SttsBox,         // Time-to-Sample Box
    pub ctts: Option<CttsBox>, // Composition Time-to-Sample Box
    pub stss: Option<StssBox>, // Sync Sample Box
    pub stsc: StscBox,         // Sample-to-Chunk Box
    pub stsz: StszBox,         // Sample Size Box
    pub stco: Option<StcoBox>, // Chunk Offset Box
    pub co64: Option<Co64Box>, // Chunk Offset Box (64-bit)
    pub unreadable: Option<TableError>, // First required table that is missing or malformed
}

/// A required sample table that is missing or failed to decode. The track stays listed
/// with its headers, but indexing it reports this error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    Missing { box_type: [u8; 4] },
    Malformed { box_type: [u8; 4], span: Range<u64>, reason: String },
}

impl TableError {
    pub fn to_error(&self) -> Mp4Error {
        match self {
            TableError::Missing { box_type } => Mp4Error::missing(box_type, "stbl"),
            TableError::Malformed { box_type, span, reason } => {
                Mp4Error::malformed_span(*box_type, span, reason.clone())
            }
        }
    }
}

/// Chunk offsets widened to 64 bits, from whichever offset table the track has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOffsets<'a> {
    pub box_type: [u8; 4],
    pub span: &'a Range<u64>,
    pub offsets: Vec<u64>,
}

impl StblBox {
    pub fn chunk_offsets(&self) -> ChunkOffsets<'_> {
        match (&self.co64, &self.stco) {
            (Some(co64), _) => ChunkOffsets {
                box_type: *b"co64",
                span: &co64.span,
                offsets: co64.chunk_offsets.clone(),
            },
            (None, Some(stco)) => ChunkOffsets {
                box_type: *b"stco",
                span: &stco.span,
                offsets: stco.chunk_offsets.iter().map(|&o| o as u64).collect(),
            },
            (None, None) => ChunkOffsets {
                box_type: *b"stco",
                span: &self.stsc.span,
                offsets: Vec::new(),
            },
        }
    }
}

impl std::fmt::Debug for StblBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StblBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("stsd", &self.stsd)
            .field("stts", &self.stts)
            .field("ctts", &self.ctts)
            .field("stss", &self.stss)
            .field("stsc", &self.stsc)
            .field("stsz", &self.stsz)
            .field("stco", &self.stco)
            .field("co64", &self.co64)
            .field("unreadable", &self.unreadable)
            .finish()
    }
}

impl Mp4Box for StblBox {
    fn box_type(&self) -> [u8; 4] { *b"stbl" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        let mut stbl = StblBox::default();
        let mut stsd = None;
        let mut stts = None;
        let mut stsc = None;
        let mut stsz = None;

        let mut children = header.children(source);
        while let Some(child) = children.next() {
            let child = child?;
            let source = children.source();
            match &child.box_type {
                b"ctts" => match CttsBox::read_box(source, &child) {
                    Ok(b) => stbl.ctts = Some(b),
                    Err(e) => warn!("Ignoring unreadable ctts: {}", e),
                },
                b"stss" => match StssBox::read_box(source, &child) {
                    Ok(b) => stbl.stss = Some(b),
                    Err(e) => warn!("Ignoring unreadable stss: {}", e),
                },
                b"stsd" => stsd = required(StsdBox::read_box(source, &child), &mut stbl.unreadable)?,
                b"stts" => stts = required(SttsBox::read_box(source, &child), &mut stbl.unreadable)?,
                b"stsc" => stsc = required(StscBox::read_box(source, &child), &mut stbl.unreadable)?,
                b"stsz" => stsz = required(StszBox::read_box(source, &child), &mut stbl.unreadable)?,
                b"stco" => stbl.stco = required(StcoBox::read_box(source, &child), &mut stbl.unreadable)?,
                b"co64" => stbl.co64 = required(Co64Box::read_box(source, &child), &mut stbl.unreadable)?,
                // sdtp, sgpd, sbgp, ...
                _ => debug!("Ignoring {} inside stbl", child),
            }
        }

        let absent = [
            (b"stsd", stsd.is_none()),
            (b"stts", stts.is_none()),
            (b"stsc", stsc.is_none()),
            (b"stsz", stsz.is_none()),
            (b"stco", stbl.stco.is_none() && stbl.co64.is_none()),
        ];
        if stbl.unreadable.is_none() {
            stbl.unreadable = absent
                .iter()
                .find(|(_, absent)| *absent)
                .map(|(box_type, _)| TableError::Missing { box_type: **box_type });
        }

        stbl.stsd = stsd.unwrap_or_default();
        stbl.stts = stts.unwrap_or_default();
        stbl.stsc = stsc.unwrap_or_default();
        stbl.stsz = stsz.unwrap_or_default();
        if let Some(problem) = &stbl.unreadable {
            warn!("Sample table {} cannot be indexed: {}", header, problem.to_error());
        }
        Ok(stbl)
    }
}

// Keeps a decoded required table, or records why it could not be decoded. Errors that
// are not about the table itself (I/O failures) abort the parse.
fn required<T>(result: Result<T>, unreadable: &mut Option<TableError>) -> Result<Option<T>> {
    let problem = match result {
        Ok(table) => return Ok(Some(table)),
        Err(Mp4Error::MalformedBox { box_type, start, end, reason }) => {
            TableError::Malformed { box_type, span: start..end, reason }
        }
        Err(Mp4Error::MissingRequiredBox { box_type, .. }) => TableError::Missing { box_type },
        Err(e) => return Err(e),
    };
    unreadable.get_or_insert(problem);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        boxes::stsd::tests::{stsd_with, visual_entry},
        reader::tests::{boxed, full_boxed, read_single},
        sample_table::{tests::anywhere, SampleIndex},
    };

    fn table(box_type: &[u8; 4], values: &[u32]) -> Vec<u8> {
        let mut body = Vec::new();
        for value in values {
            body.extend_from_slice(&value.to_be_bytes());
        }
        full_boxed(box_type, 0, 0, &body)
    }

    fn minimal_children(offsets: &[u8]) -> Vec<u8> {
        let mut children = stsd_with(&[visual_entry(b"avc1", 16, 16, &[])]);
        children.extend(table(b"stts", &[1, 1, 100]));
        children.extend(table(b"stsc", &[1, 1, 1, 1]));
        children.extend(table(b"stsz", &[0, 1, 10]));
        children.extend_from_slice(offsets);
        children
    }

    #[test]
    fn reads_required_tables() {
        let bytes = boxed(b"stbl", &minimal_children(&table(b"stco", &[1, 48])));
        let stbl: StblBox = read_single(&bytes).unwrap();
        assert_eq!(stbl.stsz.entry_sizes, vec![10]);
        assert!(stbl.ctts.is_none());
        let offsets = stbl.chunk_offsets();
        assert_eq!(&offsets.box_type, b"stco");
        assert_eq!(offsets.offsets, vec![48]);
    }

    #[test]
    fn prefers_co64() {
        let mut co64 = 1u32.to_be_bytes().to_vec();
        co64.extend_from_slice(&(1u64 << 33).to_be_bytes());
        let bytes = boxed(b"stbl", &minimal_children(&full_boxed(b"co64", 0, 0, &co64)));
        let stbl: StblBox = read_single(&bytes).unwrap();
        assert_eq!(stbl.chunk_offsets().offsets, vec![1u64 << 33]);
    }

    #[test]
    fn missing_chunk_offsets_are_kept_for_indexing() {
        let stbl: StblBox = read_single(&boxed(b"stbl", &minimal_children(&[]))).unwrap();
        assert_eq!(stbl.unreadable, Some(TableError::Missing { box_type: *b"stco" }));
        let error = stbl.unreadable.as_ref().map(TableError::to_error);
        assert!(matches!(error, Some(Mp4Error::MissingRequiredBox { box_type, .. }) if &box_type == b"stco"));
    }

    #[test]
    fn malformed_required_table_does_not_fail_the_box() {
        let mut children = stsd_with(&[visual_entry(b"avc1", 16, 16, &[])]);
        // Declares two runs, holds one.
        children.extend(table(b"stts", &[2, 1, 100]));
        children.extend(table(b"stsc", &[1, 1, 1, 1]));
        children.extend(table(b"stsz", &[0, 1, 10]));
        children.extend(table(b"stco", &[1, 48]));
        let stbl: StblBox = read_single(&boxed(b"stbl", &children)).unwrap();
        assert!(matches!(
            &stbl.unreadable,
            Some(TableError::Malformed { box_type, .. }) if box_type == b"stts"
        ));
        // The tables after the broken one are still decoded.
        assert_eq!(stbl.stsz.entry_sizes, vec![10]);
        assert_eq!(stbl.chunk_offsets().offsets, vec![48]);
    }

    #[test]
    fn unreadable_optional_table_is_dropped() {
        let mut children = minimal_children(&table(b"stco", &[1, 48]));
        // Declares two sync samples, holds one.
        children.extend(table(b"stss", &[2, 1]));
        let stbl: StblBox = read_single(&boxed(b"stbl", &children)).unwrap();
        assert!(stbl.stss.is_none());
    }

    #[test]
    fn composition_offsets_with_short_entry_list_are_dropped() {
        let mut children = minimal_children(&table(b"stco", &[1, 48]));
        // Declares two (count, offset) entries, holds one.
        children.extend(table(b"ctts", &[2, 1, 200]));
        let stbl: StblBox = read_single(&boxed(b"stbl", &children)).unwrap();
        assert!(stbl.ctts.is_none());
        assert!(stbl.unreadable.is_none());

        let index = SampleIndex::build(&stbl, &anywhere()).unwrap();
        assert_eq!(index.samples[0].composition_offset, 0);
        assert_eq!(index.samples[0].presentation_time(), index.samples[0].start_time as i64);
    }
}
