//! Decoding of the H.264 decoder configuration (`avcC`) carried by an `avc1`/`avc3` sample
//! entry.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::{
    boxes::stsd::{SampleEntry, StsdBox, VISUAL_SAMPLE_ENTRY_LEN},
    error::{Mp4Error, Result},
    format_fourcc,
    reader::BoxIter,
};

/// The AVC decoder configuration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub configuration_version: u8,
    pub profile_indication: u8,
    pub profile_compatibility: u8,
    pub level_indication: u8,
    /// Width in bytes (1 to 4) of the length field in front of every NAL unit of a sample.
    pub nal_length_size: u8,
    pub sps: Vec<Vec<u8>>,
    pub pps: Vec<Vec<u8>>,
}

/// 4-byte NAL lengths and no parameter sets, for streams that carry them in-band.
impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            configuration_version: 1,
            profile_indication: 0,
            profile_compatibility: 0,
            level_indication: 0,
            nal_length_size: 4,
            sps: Vec::new(),
            pps: Vec::new(),
        }
    }
}

impl CodecConfig {
    /// Finds and decodes the `avcC` box of the single sample entry in `stsd`.
    pub fn from_sample_description(stsd: &StsdBox, track_id: u32) -> Result<Self> {
        let entry = match stsd.entries.as_slice() {
            [entry] => entry,
            [] => return Err(Mp4Error::MalformedConfiguration("stsd has no sample entry".into())),
            entries => {
                return Err(Mp4Error::UnsupportedTrack {
                    track_id,
                    reason: format!("{} sample descriptions, only one is supported", entries.len()),
                })
            }
        };
        if !entry.is_avc() {
            return Err(Mp4Error::UnsupportedTrack {
                track_id,
                reason: format!("sample entry `{}` is not H.264", format_fourcc(&entry.format)),
            });
        }

        let record = find_avcc(entry)?;
        let config = CodecConfig::parse(&record)?;
        debug!(
            "Track {}: profile {} level {}, {}-byte NAL lengths, {} SPS, {} PPS",
            track_id,
            config.profile_indication,
            config.level_indication,
            config.nal_length_size,
            config.sps.len(),
            config.pps.len()
        );
        Ok(config)
    }

    /// Decodes an `avcC` payload.
    pub fn parse(record: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(record);
        let truncated = |what: &str| {
            Mp4Error::MalformedConfiguration(format!("record ends before {}", what))
        };

        let configuration_version = cursor.read_u8().map_err(|_| truncated("configurationVersion"))?;
        let profile_indication = cursor.read_u8().map_err(|_| truncated("AVCProfileIndication"))?;
        let profile_compatibility = cursor.read_u8().map_err(|_| truncated("profile_compatibility"))?;
        let level_indication = cursor.read_u8().map_err(|_| truncated("AVCLevelIndication"))?;
        let nal_length_size = (cursor.read_u8().map_err(|_| truncated("lengthSizeMinusOne"))? & 0x03) + 1;
        if nal_length_size == 3 {
            debug!("Unusual 3-byte NAL length fields");
        }

        let sps_count = cursor.read_u8().map_err(|_| truncated("numOfSequenceParameterSets"))? & 0x1F;
        let sps = read_parameter_sets(&mut cursor, sps_count, "SPS")?;
        let pps_count = cursor.read_u8().map_err(|_| truncated("numOfPictureParameterSets"))?;
        let pps = read_parameter_sets(&mut cursor, pps_count, "PPS")?;

        Ok(CodecConfig {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            nal_length_size,
            sps,
            pps,
        })
    }
}

fn read_parameter_sets(cursor: &mut Cursor<&[u8]>, count: u8, kind: &str) -> Result<Vec<Vec<u8>>> {
    let mut sets = Vec::with_capacity(count as usize);
    for i in 0..count {
        let len = cursor.read_u16::<BigEndian>().map_err(|_| {
            Mp4Error::MalformedConfiguration(format!("record ends before the length of {} #{}", kind, i + 1))
        })? as usize;
        let remaining = cursor.get_ref().len() - cursor.position() as usize;
        if len > remaining {
            return Err(Mp4Error::MalformedConfiguration(format!(
                "{} #{} declares {} bytes but only {} remain",
                kind,
                i + 1,
                len,
                remaining
            )));
        }
        let mut set = vec![0u8; len];
        cursor.read_exact(&mut set)?;
        sets.push(set);
    }
    Ok(sets)
}

// Walks the boxes after the fixed visual sample entry fields and returns the payload of
// `avcC`. Box errors are reported with absolute file positions.
fn find_avcc(entry: &SampleEntry) -> Result<Vec<u8>> {
    if entry.visual_extensions().is_none() {
        return Err(Mp4Error::MalformedConfiguration(format!(
            "`{}` sample entry is {} bytes, shorter than a visual sample entry",
            format_fourcc(&entry.format),
            entry.data.len()
        )));
    }

    let relocate = |e: Mp4Error| match e {
        Mp4Error::MalformedBox { box_type, start, end, reason } => Mp4Error::MalformedBox {
            box_type,
            start: start + entry.payload_start,
            end: end + entry.payload_start,
            reason,
        },
        other => other,
    };

    let mut source = Cursor::new(entry.data.as_slice());
    let start = VISUAL_SAMPLE_ENTRY_LEN as u64;
    let length = entry.data.len() as u64 - start;
    let mut children = BoxIter::new(&mut source, entry.format, start, length);
    while let Some(child) = children.next() {
        let child = child.map_err(relocate)?;
        if &child.box_type == b"avcC" {
            return child.read_payload(children.source()).map_err(relocate);
        }
        debug!("Skipping {} in `{}` sample entry", child, format_fourcc(&entry.format));
    }

    Err(Mp4Error::MalformedConfiguration(format!(
        "`{}` sample entry has no avcC box",
        format_fourcc(&entry.format)
    )))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::boxes::stsd::tests::{stsd_with, visual_entry};
    use crate::reader::tests::{boxed, read_single};

    pub(crate) fn avcc_record(nal_length_size: u8, sps: &[&[u8]], pps: &[&[u8]]) -> Vec<u8> {
        let mut record = vec![1, 0x64, 0x00, 0x1F, 0xFC | (nal_length_size - 1), 0xE0 | sps.len() as u8];
        for set in sps {
            record.extend_from_slice(&(set.len() as u16).to_be_bytes());
            record.extend_from_slice(set);
        }
        record.push(pps.len() as u8);
        for set in pps {
            record.extend_from_slice(&(set.len() as u16).to_be_bytes());
            record.extend_from_slice(set);
        }
        record
    }

    const SPS: [u8; 8] = [0x67, 0x64, 0x00, 0x1F, 0xAC, 0xD9, 0x40, 0x50];
    const PPS: [u8; 4] = [0x68, 0xEB, 0xE3, 0xCB];

    #[test]
    fn decodes_parameter_sets_byte_exact() {
        let config = CodecConfig::parse(&avcc_record(4, &[&SPS], &[&PPS])).unwrap();
        assert_eq!(config.configuration_version, 1);
        assert_eq!(config.profile_indication, 0x64);
        assert_eq!(config.level_indication, 0x1F);
        assert_eq!(config.nal_length_size, 4);
        assert_eq!(config.sps, vec![SPS.to_vec()]);
        assert_eq!(config.pps, vec![PPS.to_vec()]);
    }

    #[test]
    fn nal_length_size_uses_low_two_bits() {
        let config = CodecConfig::parse(&avcc_record(2, &[&SPS], &[&PPS])).unwrap();
        assert_eq!(config.nal_length_size, 2);
    }

    #[test]
    fn overlong_parameter_set_is_malformed() {
        let mut record = avcc_record(4, &[&SPS], &[&PPS]);
        // SPS length 8 -> 200
        record[7] = 200;
        assert!(matches!(CodecConfig::parse(&record), Err(Mp4Error::MalformedConfiguration(_))));
    }

    #[test]
    fn truncated_record_is_malformed() {
        assert!(matches!(CodecConfig::parse(&[1, 0x42, 0]), Err(Mp4Error::MalformedConfiguration(_))));
    }

    #[test]
    fn finds_avcc_after_other_extension_boxes() {
        let mut extensions = boxed(b"pasp", &[0, 0, 0, 1, 0, 0, 0, 1]);
        extensions.extend(boxed(b"avcC", &avcc_record(4, &[&SPS], &[&PPS])));
        let stsd: StsdBox = read_single(&stsd_with(&[visual_entry(b"avc1", 64, 64, &extensions)])).unwrap();

        let config = CodecConfig::from_sample_description(&stsd, 1).unwrap();
        assert_eq!(config.sps[0], SPS);
    }

    #[test]
    fn missing_avcc_is_malformed_configuration() {
        let stsd: StsdBox = read_single(&stsd_with(&[visual_entry(b"avc1", 64, 64, &[])])).unwrap();
        assert!(matches!(
            CodecConfig::from_sample_description(&stsd, 1),
            Err(Mp4Error::MalformedConfiguration(_))
        ));
    }

    #[test]
    fn other_codecs_and_multiple_entries_are_unsupported() {
        let hevc: StsdBox = read_single(&stsd_with(&[visual_entry(b"hvc1", 64, 64, &[])])).unwrap();
        assert!(matches!(
            CodecConfig::from_sample_description(&hevc, 3),
            Err(Mp4Error::UnsupportedTrack { track_id: 3, .. })
        ));

        let entry = visual_entry(b"avc1", 64, 64, &boxed(b"avcC", &avcc_record(4, &[&SPS], &[&PPS])));
        let two: StsdBox = read_single(&stsd_with(&[entry.clone(), entry])).unwrap();
        assert!(matches!(
            CodecConfig::from_sample_description(&two, 1),
            Err(Mp4Error::UnsupportedTrack { .. })
        ));
    }

    #[test]
    fn avcc_overrunning_the_entry_reports_file_position() {
        let mut avcc = boxed(b"avcC", &avcc_record(4, &[&SPS], &[&PPS]));
        avcc[3] += 50;
        let stsd: StsdBox = read_single(&stsd_with(&[visual_entry(b"avc1", 64, 64, &avcc)])).unwrap();
        match CodecConfig::from_sample_description(&stsd, 1) {
            Err(Mp4Error::MalformedBox { box_type, start, .. }) => {
                assert_eq!(&box_type, b"avcC");
                // stsd header (16) + entry header (8) + fixed visual fields (78)
                assert_eq!(start, 102);
            }
            other => panic!("expected MalformedBox, got {:?}", other),
        }
    }
}
