// This module contains the typed structures for the MP4 boxes the demuxer understands.
// Each submodule decodes one box type from its payload; container boxes walk their
// children through `reader::read_mp4_box` and keep the ones they need.
//
// The following submodules are included:
//
// - `co64`: Chunk Offset Box with 64-bit offsets.
// - `ctts`: Composition Time-to-Sample Box, the per-sample decode-to-presentation offsets.
// - `dinf`: Data Information Box, container for `dref`.
// - `dref`: Data Reference Box, says whether the media data lives in this file.
// - `edts`: Edit Box, container for `elst`.
// - `elst`: Edit List Box, maps media time to presentation time.
// - `enums`: `Mp4BoxEnum`, the closed set of decoded box kinds.
// - `fixed`: Fixed-point numbers and the transform matrix used by the header boxes.
// - `ftyp`: File Type Box, brands and compatibility.
// - `generic`: The `Mp4Box` trait and `UnknownBox` for skipped types.
// - `hdlr`: Handler Reference Box, the media type of a track (`vide`, `soun`, ...).
// - `mdat`: Media Data Box, recorded by position only.
// - `mdhd`: Media Header Box, media timescale, duration and language.
// - `mdia`: Media Box, container for `mdhd`, `hdlr` and `minf`.
// - `meta`: Metadata Box.
// - `minf`: Media Information Box, container for the media header and `stbl`.
// - `moov`: Movie Box, root of the metadata tree.
// - `mvhd`: Movie Header Box, movie-wide timing.
// - `smhd`: Sound Media Header Box.
// - `stbl`: Sample Table Box, container for the sample tables.
// - `stco`: Chunk Offset Box with 32-bit offsets.
// - `stsc`: Sample-to-Chunk Box.
// - `stsd`: Sample Description Box, the codec-specific sample entries.
// - `stss`: Sync Sample Box, the random access points.
// - `stsz`: Sample Size Box.
// - `stts`: Time-to-Sample Box, decode durations.
// - `tkhd`: Track Header Box.
// - `trak`: Track Box.
// - `udta`: User Data Box.
// - `vmhd`: Video Media Header Box.

pub mod co64;
pub mod ctts;
pub mod dinf;
pub mod dref;
pub mod edts;
pub mod elst;
pub mod enums;
pub mod fixed;
pub mod ftyp;
pub mod generic;
pub mod hdlr;
pub mod mdat;
pub mod mdhd;
pub mod mdia;
pub mod meta;
pub mod minf;
pub mod moov;
pub mod mvhd;
pub mod smhd;
pub mod stbl;
pub mod stco;
pub mod stsc;
pub mod stsd;
pub mod stss;
pub mod stsz;
pub mod stts;
pub mod tkhd;
pub mod trak;
pub mod udta;
pub mod vmhd;
