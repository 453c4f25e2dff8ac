use std::io::{Read, Seek};

use mp4_demux::{boxes::trak::TrakBox, format_fourcc, Demuxer, Result};
use tracing::{info, warn};

/// Logs the movie header and, per track, its media details, chunk table and optionally every sample.
pub fn print_info<R: Read + Seek>(demuxer: &Demuxer<R>, with_samples: bool) -> Result<()> {
    let file = demuxer.file();
    let brands: Vec<String> = file.ftyp.compatible_brands.iter().map(format_fourcc).collect();
    info!(
        "File: {} bytes, brand `{}` v{}, compatible with [{}]",
        file.size,
        format_fourcc(&file.ftyp.major_brand),
        file.ftyp.minor_version,
        brands.join(", ")
    );

    let mvhd = &file.moov.mvhd;
    info!(
        "Movie: timescale {}, duration {} ({:.3}s), rate {:.2}, next track id {}",
        mvhd.timescale,
        mvhd.duration,
        mvhd.duration_seconds().unwrap_or(0.0),
        mvhd.rate.to_f64(),
        mvhd.next_track_id
    );
    for mdat in &file.mdat {
        info!("Media data: {:?}", mdat.payload());
    }

    for trak in demuxer.tracks() {
        print_track(trak, with_samples)?;
    }
    Ok(())
}

fn print_track(trak: &TrakBox, with_samples: bool) -> Result<()> {
    let mdhd = &trak.mdia.mdhd;
    info!(
        "Track {}: handler `{}` ({}), {}x{}, timescale {}, duration {}, language {}{}",
        trak.track_id(),
        format_fourcc(&trak.mdia.hdlr.handler_type),
        trak.mdia.hdlr.name,
        trak.tkhd.width.integer(),
        trak.tkhd.height.integer(),
        mdhd.timescale,
        mdhd.duration,
        mdhd.language.code(),
        if trak.tkhd.is_enabled() { "" } else { ", disabled" }
    );

    if let Some(elst) = trak.edts.as_ref().and_then(|e| e.elst.as_ref()) {
        for entry in &elst.entries {
            info!(
                "  Edit: duration {}, media time {}, rate {:.2}{}",
                entry.segment_duration,
                entry.media_time,
                entry.media_rate.to_f64(),
                if entry.is_empty_edit() { " (empty)" } else { "" }
            );
        }
    }

    for entry in &trak.stbl().stsd.entries {
        match entry.visual() {
            Ok(visual) if trak.is_video() => info!(
                "  Sample entry `{}`: {}x{}, depth {}, compressor `{}`",
                format_fourcc(&entry.format),
                visual.width,
                visual.height,
                visual.depth,
                visual.compressor_name
            ),
            _ => info!("  Sample entry `{}`: {} bytes", format_fourcc(&entry.format), entry.data.len()),
        }
    }
    if trak.is_avc() {
        match trak.codec_config() {
            Ok(config) => info!(
                "  avcC: profile {} level {}, {}-byte NAL lengths, {} SPS, {} PPS",
                config.profile_indication,
                config.level_indication,
                config.nal_length_size,
                config.sps.len(),
                config.pps.len()
            ),
            Err(e) => warn!("  avcC: {}", e),
        }
    }

    let index = match trak.sample_index() {
        Ok(index) => index,
        Err(e) => {
            warn!("  Sample table: {}", e);
            return Ok(());
        }
    };
    info!(
        "  {} chunks, {} samples, {} sync samples, total duration {}",
        index.chunks.len(),
        index.len(),
        index.sync_samples().count(),
        index.total_duration()
    );
    for (i, chunk) in index.chunks.iter().enumerate() {
        info!(
            "  Chunk #{}: offset {}, {} samples from #{}, description {}",
            i + 1,
            chunk.offset,
            chunk.sample_count,
            chunk.start_sample_index,
            chunk.sample_description_index
        );
    }
    if with_samples {
        for (i, sample) in index.samples.iter().enumerate() {
            info!(
                "  Sample #{}: offset {}, size {}, dts {}, pts {}, duration {}{}",
                i + 1,
                sample.offset,
                sample.size,
                sample.start_time,
                sample.presentation_time(),
                sample.duration,
                if sample.is_sync { ", sync" } else { "" }
            );
        }
    }
    Ok(())
}
