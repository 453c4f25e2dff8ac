// Builds small but complete progressive MP4 files for the integration tests.
#![allow(dead_code)]

#[derive(Clone, Debug)]
pub struct TrackConfig {
    pub track_id: u32,
    pub handler_type: [u8; 4],          // b"vide", b"soun", ...
    pub codec_fourcc: [u8; 4],          // Sample entry type, e.g. b"avc1"
    pub timescale: u32,
    pub sample_duration: u32,           // Same decode duration for every sample
    pub nal_length_size: u8,
    pub sps: Vec<Vec<u8>>,
    pub pps: Vec<Vec<u8>>,
    pub chunks: Vec<Vec<Vec<u8>>>,      // chunk -> samples -> sample bytes
}

impl TrackConfig {
    pub fn h264(track_id: u32, sps: &[u8], pps: &[u8], chunks: Vec<Vec<Vec<u8>>>) -> Self {
        TrackConfig {
            track_id,
            handler_type: *b"vide",
            codec_fourcc: *b"avc1",
            timescale: 90_000,
            sample_duration: 3000,
            nal_length_size: 4,
            sps: vec![sps.to_vec()],
            pps: vec![pps.to_vec()],
            chunks,
        }
    }

    pub fn audio(track_id: u32, chunks: Vec<Vec<Vec<u8>>>) -> Self {
        TrackConfig {
            track_id,
            handler_type: *b"soun",
            codec_fourcc: *b"mp4a",
            timescale: 48_000,
            sample_duration: 1024,
            nal_length_size: 4,
            sps: Vec::new(),
            pps: Vec::new(),
            chunks,
        }
    }

    fn sample_count(&self) -> u32 {
        self.chunks.iter().map(|c| c.len() as u32).sum()
    }
}

/// A sample holding `units`, each behind a `width`-byte big-endian length.
pub fn length_prefixed(width: usize, units: &[&[u8]]) -> Vec<u8> {
    let mut sample = Vec::new();
    for unit in units {
        sample.extend_from_slice(&(unit.len() as u32).to_be_bytes()[4 - width..]);
        sample.extend_from_slice(unit);
    }
    sample
}

pub fn write_box(buffer: &mut Vec<u8>, box_type: &[u8; 4], payload: &[u8]) {
    buffer.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    buffer.extend_from_slice(box_type);
    buffer.extend_from_slice(payload);
}

pub fn write_full_box(buffer: &mut Vec<u8>, box_type: &[u8; 4], version: u8, flags: u32, body: &[u8]) {
    let mut payload = vec![version];
    payload.extend_from_slice(&flags.to_be_bytes()[1..4]);
    payload.extend_from_slice(body);
    write_box(buffer, box_type, &payload);
}

/// Position of the first `box_type` tag in `data`; the box starts four bytes earlier.
pub fn find_tag(data: &[u8], box_type: &[u8; 4]) -> usize {
    data.windows(4)
        .position(|w| w == box_type)
        .unwrap_or_else(|| panic!("no {:?} box", std::str::from_utf8(box_type)))
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

const IDENTITY: [u32; 9] = [0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000];

/// `ftyp`, then `moov`, then a single `mdat` holding every chunk of every track in order.
pub fn create_test_file(tracks: &[TrackConfig]) -> Vec<u8> {
    create_test_file_with(tracks, &[])
}

/// Like [`create_test_file`], with `moov_extra` appended to the `moov` payload after the tracks.
pub fn create_test_file_with(tracks: &[TrackConfig], moov_extra: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(4096);

    // 1) FTYP
    let mut ftyp = b"isom".to_vec();
    ftyp.extend_from_slice(&0x200u32.to_be_bytes());
    ftyp.extend_from_slice(b"isomiso2avc1mp41");
    write_box(&mut buffer, b"ftyp", &ftyp);

    // 2) MOOV. Chunk offsets depend on its size, which does not depend on their values.
    let placeholder = write_moov(tracks, 0, moov_extra);
    let mdat_payload_start = (buffer.len() + placeholder.len() + 8) as u64;
    buffer.extend(write_moov(tracks, mdat_payload_start, moov_extra));

    // 3) MDAT
    let media: Vec<u8> = tracks
        .iter()
        .flat_map(|t| t.chunks.iter().flatten().flatten().copied())
        .collect();
    write_box(&mut buffer, b"mdat", &media);

    buffer
}

fn write_moov(tracks: &[TrackConfig], mdat_payload_start: u64, extra: &[u8]) -> Vec<u8> {
    let mut moov = Vec::new();

    let mut mvhd = vec![0; 8];
    mvhd.extend(u32s(&[1000, 0, 0x0001_0000]));
    mvhd.extend_from_slice(&0x0100u16.to_be_bytes());
    mvhd.extend_from_slice(&[0; 10]);
    mvhd.extend(u32s(&IDENTITY));
    mvhd.extend_from_slice(&[0; 24]);
    mvhd.extend(u32s(&[tracks.len() as u32 + 1]));
    write_full_box(&mut moov, b"mvhd", 0, 0, &mvhd);

    let mut next_offset = mdat_payload_start;
    for track in tracks {
        let mut offsets = Vec::new();
        for chunk in &track.chunks {
            offsets.push(next_offset as u32);
            next_offset += chunk.iter().map(|s| s.len() as u64).sum::<u64>();
        }
        write_box(&mut moov, b"trak", &write_trak(track, &offsets));
    }
    moov.extend_from_slice(extra);

    let mut result = Vec::new();
    write_box(&mut result, b"moov", &moov);
    result
}

fn write_trak(track: &TrackConfig, offsets: &[u32]) -> Vec<u8> {
    let mut trak = Vec::new();

    let mut tkhd = vec![0; 8];
    tkhd.extend(u32s(&[track.track_id, 0, 0, 0, 0]));
    tkhd.extend_from_slice(&[0; 8]);
    tkhd.extend(u32s(&IDENTITY));
    tkhd.extend(u32s(&[320 << 16, 240 << 16]));
    write_full_box(&mut trak, b"tkhd", 0, 7, &tkhd);

    let mut mdia = Vec::new();
    let mut mdhd = vec![0; 8];
    mdhd.extend(u32s(&[track.timescale, track.sample_count() * track.sample_duration]));
    mdhd.extend_from_slice(&0x55C4u16.to_be_bytes()); // und
    mdhd.extend_from_slice(&[0; 2]);
    write_full_box(&mut mdia, b"mdhd", 0, 0, &mdhd);

    let mut hdlr = vec![0; 4];
    hdlr.extend_from_slice(&track.handler_type);
    hdlr.extend_from_slice(&[0; 12]);
    hdlr.extend_from_slice(b"Handler\0");
    write_full_box(&mut mdia, b"hdlr", 0, 0, &hdlr);

    let mut minf = Vec::new();
    if &track.handler_type == b"vide" {
        write_full_box(&mut minf, b"vmhd", 0, 1, &[0; 8]);
    } else {
        write_full_box(&mut minf, b"smhd", 0, 0, &[0; 4]);
    }
    let mut dref = u32s(&[1]);
    write_full_box(&mut dref, b"url ", 0, 1, &[]);
    let mut dinf = Vec::new();
    write_full_box(&mut dinf, b"dref", 0, 0, &dref);
    write_box(&mut minf, b"dinf", &dinf);
    write_box(&mut minf, b"stbl", &write_stbl(track, offsets));
    write_box(&mut mdia, b"minf", &minf);

    write_box(&mut trak, b"mdia", &mdia);
    trak
}

fn write_stbl(track: &TrackConfig, offsets: &[u32]) -> Vec<u8> {
    let mut stbl = Vec::new();

    let mut stsd = u32s(&[1]);
    write_box(&mut stsd, &track.codec_fourcc, &sample_entry(track));
    write_full_box(&mut stbl, b"stsd", 0, 0, &stsd);

    write_full_box(&mut stbl, b"stts", 0, 0, &u32s(&[1, track.sample_count(), track.sample_duration]));

    let mut stsc = vec![track.chunks.len() as u32];
    for (i, chunk) in track.chunks.iter().enumerate() {
        stsc.extend_from_slice(&[i as u32 + 1, chunk.len() as u32, 1]);
    }
    write_full_box(&mut stbl, b"stsc", 0, 0, &u32s(&stsc));

    let mut stsz = vec![0, track.sample_count()];
    stsz.extend(track.chunks.iter().flatten().map(|s| s.len() as u32));
    write_full_box(&mut stbl, b"stsz", 0, 0, &u32s(&stsz));

    let mut stco = vec![offsets.len() as u32];
    stco.extend_from_slice(offsets);
    write_full_box(&mut stbl, b"stco", 0, 0, &u32s(&stco));

    stbl
}

fn sample_entry(track: &TrackConfig) -> Vec<u8> {
    let mut entry = vec![0; 6];
    entry.extend_from_slice(&1u16.to_be_bytes()); // data_reference_index
    if &track.handler_type != b"vide" {
        // AudioSampleEntry: reserved, channels, sample size, pre_defined, reserved, rate
        entry.extend_from_slice(&[0; 8]);
        entry.extend_from_slice(&[0, 2, 0, 16, 0, 0, 0, 0]);
        entry.extend(u32s(&[track.timescale << 16]));
        return entry;
    }

    entry.extend_from_slice(&[0; 16]);
    entry.extend_from_slice(&320u16.to_be_bytes());
    entry.extend_from_slice(&240u16.to_be_bytes());
    entry.extend(u32s(&[0x0048_0000, 0x0048_0000, 0]));
    entry.extend_from_slice(&1u16.to_be_bytes());
    entry.extend_from_slice(&[0; 32]);
    entry.extend_from_slice(&0x0018u16.to_be_bytes());
    entry.extend_from_slice(&0xFFFFu16.to_be_bytes());

    let mut avcc = vec![1, 0x42, 0xC0, 0x1E, 0xFC | (track.nal_length_size - 1)];
    avcc.push(0xE0 | track.sps.len() as u8);
    for sps in &track.sps {
        avcc.extend_from_slice(&(sps.len() as u16).to_be_bytes());
        avcc.extend_from_slice(sps);
    }
    avcc.push(track.pps.len() as u8);
    for pps in &track.pps {
        avcc.extend_from_slice(&(pps.len() as u16).to_be_bytes());
        avcc.extend_from_slice(pps);
    }
    write_box(&mut entry, b"avcC", &avcc);
    entry
}
