use std::io::{Read, Seek};

use crate::{
    error::{Mp4Error, Result},
    format_fourcc,
    reader::{BoxHeader, PayloadReader},
};

use super::generic::Mp4Box;

/// Set on a `url ` entry whose media data is in the same file.
pub const SELF_CONTAINED: u32 = 0x000001;

// The `DrefBox` struct represents a Data Reference Box in the MP4 file format.
// Each entry names where a track's media data lives. Sample entries refer to them
// by 1-based index.
#[derive(Clone)]
pub struct DrefBox { // Data Reference Box
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<DataEntry>,
}

// One `url ` or `urn ` entry. A self-contained entry carries no location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub entry_type: [u8; 4],
    pub flags: u32,
    pub location: String,
}

impl DataEntry {
    pub fn is_self_contained(&self) -> bool {
        self.flags & SELF_CONTAINED != 0
    }
}

impl DrefBox {
    /// True when every entry points into this file.
    pub fn is_self_contained(&self) -> bool {
        self.entries.iter().all(DataEntry::is_self_contained)
    }
}

impl Default for DrefBox {
    fn default() -> Self {
        DrefBox {
            version: 0,
            flags: 0,
            entries: vec![DataEntry {
                entry_type: *b"url ",
                flags: SELF_CONTAINED,
                location: String::new(),
            }],
        }
    }
}

impl std::fmt::Debug for DrefBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrefBox")
            .field("box_type", &format_fourcc(&self.box_type()))
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("entries", &self.entries)
            .finish()
    }
}

impl Mp4Box for DrefBox {
    fn box_type(&self) -> [u8; 4] { *b"dref" }

    fn read_box<R: Read + Seek>(source: &mut R, header: &BoxHeader) -> Result<Self> {
        // Version, flags and entry_count; the entries are read as child boxes.
        let data = header.read_payload_prefix(source, 8)?;
        let mut payload = PayloadReader::new(header, &data);
        let (version, flags) = payload.version_and_flags()?;
        let entry_count = payload.u32()?;

        // Entries are full boxes of their own, right after the count.
        let mut entries = Vec::new();
        let mut children = header.children_after(source, 8);
        while let Some(child) = children.next() {
            let child = child?;
            let entry_data = child.read_payload(children.source())?;
            let mut entry = PayloadReader::new(&child, &entry_data);
            let (_, entry_flags) = entry.version_and_flags()?;
            let location = String::from_utf8_lossy(entry.rest())
                .trim_end_matches('\0')
                .to_string();
            entries.push(DataEntry {
                entry_type: child.box_type,
                flags: entry_flags,
                location,
            });
        }

        if entries.len() != entry_count as usize {
            return Err(Mp4Error::malformed(
                header,
                format!("entry_count {} but {} entries present", entry_count, entries.len()),
            ));
        }

        Ok(DrefBox { version, flags, entries })
    }
}
