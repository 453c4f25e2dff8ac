use std::ops::Range;

use thiserror::Error;

use crate::{format_fourcc, reader::BoxHeader};

#[derive(Debug, Error)]
pub enum Mp4Error {
    /// A box overruns its parent, or its payload disagrees with its own declared counts.
    #[error("malformed `{}` box at bytes {start}..{end}: {reason}", format_fourcc(.box_type))]
    MalformedBox {
        box_type: [u8; 4],
        start: u64,
        end: u64,
        reason: String,
    },

    #[error("missing required `{}` box in {parent}", format_fourcc(.box_type))]
    MissingRequiredBox {
        box_type: [u8; 4],
        parent: &'static str,
    },

    #[error("malformed AVC configuration: {0}")]
    MalformedConfiguration(String),

    /// Only raised under [`crate::NalFraming::Strict`]; the lenient framing clamps and counts instead.
    #[error("sample #{sample} declares a {declared}-byte NAL unit but only {remaining} bytes remain")]
    TruncatedSample {
        sample: usize,
        declared: u64,
        remaining: u64,
    },

    #[error("track {0} not found")]
    TrackNotFound(u32),

    #[error("track {track_id} is not supported: {reason}")]
    UnsupportedTrack { track_id: u32, reason: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Mp4Error>;

impl Mp4Error {
    pub fn malformed(header: &BoxHeader, reason: impl Into<String>) -> Self {
        Self::malformed_span(header.box_type, &header.span(), reason)
    }

    pub fn malformed_span(box_type: [u8; 4], span: &Range<u64>, reason: impl Into<String>) -> Self {
        Mp4Error::MalformedBox {
            box_type,
            start: span.start,
            end: span.end,
            reason: reason.into(),
        }
    }

    pub fn missing(box_type: &[u8; 4], parent: &'static str) -> Self {
        Mp4Error::MissingRequiredBox {
            box_type: *box_type,
            parent,
        }
    }
}
