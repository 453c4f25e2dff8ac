//! Conversion from length-prefixed NAL units (as stored in MP4 samples) to the Annex-B
//! byte stream format.
//!
//! No emulation prevention bytes are added or removed: the NAL payloads are copied as is.

use std::io::{ErrorKind, Read, Write};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::{trace, warn};

use crate::error::{Mp4Error, Result};

pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// How to handle a NAL length field that claims more bytes than its sample has left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NalFraming {
    /// Clamp the unit to the bytes that remain, count it, and move on to the next sample.
    #[default]
    Lenient,
    /// Fail with `Mp4Error::TruncatedSample`.
    Strict,
}

/// `nal_unit_type` from the first byte of a NAL unit.
pub fn nal_unit_type(header: u8) -> u8 {
    header & 0x1F
}

pub fn nal_unit_type_name(nal_type: u8) -> &'static str {
    match nal_type {
        1 => "non-IDR slice",
        5 => "IDR slice",
        6 => "SEI",
        7 => "SPS",
        8 => "PPS",
        9 => "access unit delimiter",
        12 => "filler",
        _ => "other",
    }
}

/// The NAL units of one sample.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NalUnits<'a> {
    pub units: Vec<&'a [u8]>,
    /// Units cut short because their length field overran the sample. At most 1 per sample.
    pub truncated: usize,
}

/// Splits a sample into its NAL units. `sample_number` is only used in diagnostics.
///
/// Zero-length units are skipped: they are not returned, so no bare start code is ever
/// written for them, and they do not count as truncations.
///
/// Under `NalFraming::Lenient` a length that overruns the sample is clamped to the bytes
/// left and ends the sample, and trailing bytes too short to hold a length field are
/// dropped; both count as one truncation.
pub fn split_nal_units(
    sample: &[u8],
    nal_length_size: u8,
    framing: NalFraming,
    sample_number: usize,
) -> Result<NalUnits<'_>> {
    let width = nal_length_size as usize;
    if !(1..=4).contains(&width) {
        return Err(Mp4Error::MalformedConfiguration(format!(
            "NAL length size {} is outside 1..=4",
            nal_length_size
        )));
    }

    let mut split = NalUnits::default();
    let mut rest = sample;
    while !rest.is_empty() {
        if rest.len() < width {
            truncated(framing, sample_number, width as u64, rest.len() as u64)?;
            split.truncated += 1;
            break;
        }
        let declared = read_length(&rest[..width]);
        rest = &rest[width..];

        let len = if declared > rest.len() as u64 {
            truncated(framing, sample_number, declared, rest.len() as u64)?;
            split.truncated += 1;
            rest.len()
        } else {
            declared as usize
        };

        let (unit, tail) = rest.split_at(len);
        if unit.is_empty() {
            trace!("Sample #{}: skipping empty NAL unit", sample_number);
        } else {
            split.units.push(unit);
        }
        rest = tail;
    }
    Ok(split)
}

fn read_length(field: &[u8]) -> u64 {
    field.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn truncated(framing: NalFraming, sample: usize, declared: u64, remaining: u64) -> Result<()> {
    match framing {
        NalFraming::Strict => Err(Mp4Error::TruncatedSample { sample, declared, remaining }),
        NalFraming::Lenient => {
            warn!(
                "Sample #{}: NAL unit declares {} bytes but only {} remain, clamping",
                sample, declared, remaining
            );
            Ok(())
        }
    }
}

/// Appends `unit` with its start code.
pub fn push_unit(out: &mut Vec<u8>, unit: &[u8]) {
    out.reserve(START_CODE.len() + unit.len());
    out.extend_from_slice(&START_CODE);
    out.extend_from_slice(unit);
}

/// Totals from [`reframe`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReframeReport {
    pub nal_units: u64,
    pub bytes_written: u64,
    pub truncated_nal_units: u64,
}

/// Converts a raw stream of length-prefixed NAL units (no container) into Annex-B.
///
/// The whole input is treated as one budget: a unit whose length runs past the end of the
/// input is handled according to `framing`, like the last unit of a sample.
pub fn reframe<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    nal_length_size: u8,
    framing: NalFraming,
) -> Result<ReframeReport> {
    if !(1..=4).contains(&nal_length_size) {
        return Err(Mp4Error::MalformedConfiguration(format!(
            "NAL length size {} is outside 1..=4",
            nal_length_size
        )));
    }

    let mut report = ReframeReport::default();
    let mut unit = Vec::new();
    loop {
        let declared = match input.read_uint::<BigEndian>(nal_length_size as usize) {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        unit.clear();
        input.by_ref().take(declared).read_to_end(&mut unit)?;
        if (unit.len() as u64) < declared {
            truncated(framing, report.nal_units as usize + 1, declared, unit.len() as u64)?;
            report.truncated_nal_units += 1;
        }

        output.write_all(&START_CODE)?;
        output.write_all(&unit)?;
        report.nal_units += 1;
        report.bytes_written += (START_CODE.len() + unit.len()) as u64;
        trace!(
            "NAL unit {} ({}), {} bytes",
            report.nal_units,
            nal_unit_type_name(unit.first().map_or(0, |&b| nal_unit_type(b))),
            unit.len()
        );
    }
    output.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn length_prefixed(width: usize, units: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in units {
            out.extend_from_slice(&(unit.len() as u32).to_be_bytes()[4 - width..]);
            out.extend_from_slice(unit);
        }
        out
    }

    #[test]
    fn splits_units_in_order() {
        let sample = length_prefixed(4, &[&[0x65, 1, 2], &[0x41; 5]]);
        let split = split_nal_units(&sample, 4, NalFraming::Lenient, 1).unwrap();
        assert_eq!(split.units, vec![&[0x65u8, 1, 2][..], &[0x41u8; 5][..]]);
        assert_eq!(split.truncated, 0);
    }

    #[test]
    fn zero_length_units_are_skipped() {
        let sample = length_prefixed(4, &[&[0x65, 1], &[], &[0x41]]);
        let split = split_nal_units(&sample, 4, NalFraming::Strict, 1).unwrap();
        assert_eq!(split.units, vec![&[0x65u8, 1][..], &[0x41u8][..]]);
        assert_eq!(split.truncated, 0);
    }

    #[test]
    fn supports_short_length_fields() {
        let sample = length_prefixed(2, &[&[0x65; 300], &[0x06]]);
        let split = split_nal_units(&sample, 2, NalFraming::Lenient, 1).unwrap();
        assert_eq!(split.units.len(), 2);
        assert_eq!(split.units[0].len(), 300);

        let sample = length_prefixed(1, &[&[0x09, 0x10]]);
        let split = split_nal_units(&sample, 1, NalFraming::Lenient, 1).unwrap();
        assert_eq!(split.units, vec![&[0x09u8, 0x10][..]]);
    }

    #[test]
    fn overlong_length_is_clamped_and_counted() {
        let mut sample = 100u32.to_be_bytes().to_vec();
        sample.extend_from_slice(&[0x65; 6]);
        let split = split_nal_units(&sample, 4, NalFraming::Lenient, 7).unwrap();
        assert_eq!(split.units, vec![&[0x65u8; 6][..]]);
        assert_eq!(split.truncated, 1);
    }

    #[test]
    fn overlong_length_fails_in_strict_mode() {
        let mut sample = 100u32.to_be_bytes().to_vec();
        sample.extend_from_slice(&[0x65; 6]);
        match split_nal_units(&sample, 4, NalFraming::Strict, 7) {
            Err(Mp4Error::TruncatedSample { sample, declared, remaining }) => {
                assert_eq!((sample, declared, remaining), (7, 100, 6));
            }
            other => panic!("expected TruncatedSample, got {:?}", other),
        }
    }

    #[test]
    fn dangling_length_field_is_a_truncation() {
        let mut sample = length_prefixed(4, &[&[0x41; 3]]);
        sample.extend_from_slice(&[0, 0]);
        let split = split_nal_units(&sample, 4, NalFraming::Lenient, 1).unwrap();
        assert_eq!(split.units.len(), 1);
        assert_eq!(split.truncated, 1);
    }

    #[test]
    fn nal_types() {
        assert_eq!(nal_unit_type(0x67), 7);
        assert_eq!(nal_unit_type(0x68), 8);
        assert_eq!(nal_unit_type_name(nal_unit_type(0x65)), "IDR slice");
    }

    #[test]
    fn reframes_raw_stream() {
        let input = length_prefixed(4, &[&[0x67, 1], &[0x68, 2, 3]]);
        let mut output = Vec::new();
        let report = reframe(&mut Cursor::new(input), &mut output, 4, NalFraming::Lenient).unwrap();
        assert_eq!(output, vec![0u8, 0, 0, 1, 0x67, 1, 0, 0, 0, 1, 0x68, 2, 3]);
        assert_eq!(report.nal_units, 2);
        assert_eq!(report.bytes_written, 13);
    }

    #[test]
    fn reframe_clamps_last_unit() {
        let mut input = 10u32.to_be_bytes().to_vec();
        input.extend_from_slice(&[0x65, 0x88]);
        let mut output = Vec::new();
        let report = reframe(&mut Cursor::new(input.clone()), &mut output, 4, NalFraming::Lenient).unwrap();
        assert_eq!(output, vec![0u8, 0, 0, 1, 0x65, 0x88]);
        assert_eq!(report.truncated_nal_units, 1);

        let strict = reframe(&mut Cursor::new(input), &mut Vec::new(), 4, NalFraming::Strict);
        assert!(matches!(strict, Err(Mp4Error::TruncatedSample { .. })));
    }
}
