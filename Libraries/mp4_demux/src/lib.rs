//! # MP4 to H.264 Annex-B demuxing
//!
//! An MP4 file is a tree of **boxes** (also called atoms). Every box starts with a header
//! that gives its total size and a 4-character type, followed by a payload that is either
//! raw data or more boxes.
//!
//! ## Boxes this library cares about
//! 1. **File Type Box (`ftyp`)**: brand and compatibility information.
//! 2. **Movie Box (`moov`)**: the metadata tree. Each `trak` holds a `mdia`, which holds a
//!    `minf`, which holds the sample table (`stbl`).
//! 3. **Media Data Box (`mdat`)**: the coded samples. Never loaded as a whole; samples are
//!    read at their absolute file offsets.
//!
//! ## Sample tables
//! The `stbl` box describes where each sample lives through several run-length tables:
//! chunk offsets (`stco`/`co64`), sample-to-chunk runs (`stsc`), sample sizes (`stsz`),
//! decode timing (`stts`) and optional composition offsets (`ctts`). The
//! [`sample_table`] module flattens them into one [`sample_table::Sample`] per sample.
//!
//! ## H.264 in MP4
//! Samples of an `avc1` track carry NAL units prefixed by a 1 to 4 byte length field, and
//! the SPS/PPS parameter sets live out of band in the `avcC` configuration record. Raw
//! decoders expect Annex-B instead: every NAL unit preceded by the `00 00 00 01` start code
//! and the parameter sets sent in-band. [`avcc`] decodes the configuration record,
//! [`annexb`] does the re-framing, and [`extract`] runs the whole conversion as a
//! producer/consumer pipeline.
//!
//! ## Implementation in This Library
//! - [`reader`] walks the box tree lazily and dispatches each box to its decoder.
//! - [`boxes`] defines one typed structure per supported box.
//! - [`demuxer::Demuxer`] ties an open source to its parsed metadata.

pub mod annexb;
pub mod avcc;
pub mod boxes;
pub mod demuxer;
pub mod error;
pub mod extract;
pub mod reader;
pub mod sample_table;

pub use avcc::CodecConfig;
pub use demuxer::Demuxer;
pub use error::{Mp4Error, Result};
pub use extract::{extract_annexb, ExtractOptions, ExtractPlan, ExtractReport, NalFraming};
pub use sample_table::{Chunk, Sample, SampleIndex};

pub fn format_fourcc(fourcc: &[u8; 4]) -> String {
    std::str::from_utf8(fourcc).unwrap_or("????").to_string()
}

pub fn format_capped_bytes(data: &[u8]) -> String {
    let capped = &data[..data.len().min(8)];
    if data.len() > 8 {
        format!("{:?} ...", capped)
    } else {
        format!("{:?}", capped)
    }
}
