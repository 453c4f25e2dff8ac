//! Flattening of the run-length sample tables of a track into one record per sample.
//!
//! The `stbl` box spreads what a player needs to locate a sample across several tables:
//! chunk offsets, the sample-to-chunk runs, per-sample sizes and the timing runs. The
//! [`SampleIndex`] built here resolves all of them once, so every [`Sample`] carries its
//! absolute file offset, size and timing.

use tracing::{debug, warn};

use crate::{
    boxes::{
        ctts::CttsBox, mdat::MdatBox, stbl::{ChunkOffsets, StblBox}, stss::StssBox,
        stts::SttsBox,
    },
    error::{Mp4Error, Result},
};

/// A run of consecutive samples stored together at one file offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub sample_count: u32,
    /// 1-based number of the first sample in this chunk.
    pub start_sample_index: u32,
    pub sample_description_index: u32,
}

/// One coded sample, in storage order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub size: u32,
    /// Absolute file offset of the first byte.
    pub offset: u64,
    /// Decode time in media timescale units.
    pub start_time: u32,
    pub duration: u32,
    /// Presentation time minus decode time.
    pub composition_offset: i32,
    pub is_sync: bool,
}

impl Sample {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size as u64)
    }

    pub fn presentation_time(&self) -> i64 {
        self.start_time as i64 + self.composition_offset as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleIndex {
    pub chunks: Vec<Chunk>,
    pub samples: Vec<Sample>,
}

impl SampleIndex {
    /// Resolves the sample tables of `stbl` against the `media_data` boxes of its file.
    ///
    /// Chunk and size tables must agree exactly, and so must the decode timing; any
    /// disagreement is a `MalformedBox` naming the offending table. Every non-empty sample
    /// must lie inside one `mdat` payload. The composition offsets and sync sample numbers
    /// are optional: when they do not fit the sample count they are dropped with a warning.
    pub fn build(stbl: &StblBox, media_data: &[MdatBox]) -> Result<Self> {
        if let Some(problem) = &stbl.unreadable {
            return Err(problem.to_error());
        }
        let offsets = stbl.chunk_offsets();
        let sample_count = stbl.stsz.sample_count;

        // A uniform size declares its sample count without listing anything, so bound it
        // by the media bytes before allocating one record per sample.
        let media_bytes: u64 = media_data.iter().map(|m| m.span.end.saturating_sub(m.payload_start)).sum();
        let declared_bytes = sample_count as u64 * stbl.stsz.sample_size as u64;
        if declared_bytes > media_bytes {
            return Err(Mp4Error::malformed_span(
                *b"stsz",
                &stbl.stsz.span,
                format!(
                    "{} samples of {} bytes exceed the {} bytes of media data",
                    sample_count, stbl.stsz.sample_size, media_bytes
                ),
            ));
        }

        let chunks = expand_chunks(stbl, &offsets.offsets)?;
        let assigned: u64 = chunks.iter().map(|c| c.sample_count as u64).sum();
        if assigned != sample_count as u64 {
            return Err(Mp4Error::malformed_span(
                *b"stsc",
                &stbl.stsc.span,
                format!(
                    "chunks hold {} samples but stsz declares {}",
                    assigned, sample_count
                ),
            ));
        }

        let mut samples = Vec::with_capacity(sample_count as usize);
        for index in 0..sample_count as usize {
            let size = stbl.stsz.size_of(index).ok_or_else(|| {
                Mp4Error::malformed_span(*b"stsz", &stbl.stsz.span, format!("no size for sample {}", index + 1))
            })?;
            samples.push(Sample { size, is_sync: true, ..Default::default() });
        }

        expand_decode_times(&stbl.stts, &mut samples)?;
        if let Some(ctts) = &stbl.ctts {
            expand_composition_offsets(ctts, &mut samples);
        }
        if let Some(stss) = &stbl.stss {
            mark_sync_samples(stss, &mut samples);
        }
        resolve_offsets(&offsets, &chunks, &mut samples)?;
        check_media_data(&offsets, media_data, &samples)?;

        debug!("Indexed {} chunks and {} samples", chunks.len(), samples.len());
        Ok(SampleIndex { chunks, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample by 1-based number, as used by `stss` and `Chunk::start_sample_index`.
    pub fn sample(&self, number: u32) -> Option<&Sample> {
        number.checked_sub(1).and_then(|i| self.samples.get(i as usize))
    }

    /// Sum of all decode durations, in media timescale units.
    pub fn total_duration(&self) -> u64 {
        self.samples.iter().map(|s| s.duration as u64).sum()
    }

    pub fn sync_samples(&self) -> impl Iterator<Item = (usize, &Sample)> {
        self.samples.iter().enumerate().filter(|(_, s)| s.is_sync)
    }
}

fn expand_chunks(stbl: &StblBox, offsets: &[u64]) -> Result<Vec<Chunk>> {
    let stsc = &stbl.stsc;
    let chunk_count = offsets.len() as u64;
    let bad = |reason: String| Mp4Error::malformed_span(*b"stsc", &stsc.span, reason);

    let mut chunks: Vec<Chunk> = offsets
        .iter()
        .map(|&offset| Chunk { offset, ..Default::default() })
        .collect();

    if let Some(first) = stsc.entries.first() {
        if first.first_chunk != 1 {
            return Err(bad(format!("first run starts at chunk {} instead of 1", first.first_chunk)));
        }
    }

    let mut next_sample: u32 = 1;
    for (i, run) in stsc.entries.iter().enumerate() {
        let first = run.first_chunk as u64;
        let end = match stsc.entries.get(i + 1) {
            Some(next) => next.first_chunk as u64,
            None => chunk_count + 1,
        };
        if first == 0 || first > chunk_count {
            return Err(bad(format!(
                "run {} starts at chunk {} but there are {} chunks",
                i + 1,
                first,
                chunk_count
            )));
        }
        if end <= first || end > chunk_count + 1 {
            return Err(bad(format!(
                "run {} first_chunk values are not strictly ascending within 1..={}",
                i + 1,
                chunk_count
            )));
        }

        for chunk in &mut chunks[(first - 1) as usize..(end - 1) as usize] {
            chunk.sample_count = run.samples_per_chunk;
            chunk.sample_description_index = run.sample_description_index;
            chunk.start_sample_index = next_sample;
            next_sample = next_sample
                .checked_add(run.samples_per_chunk)
                .ok_or_else(|| bad("sample numbering overflows 32 bits".to_string()))?;
        }
    }

    Ok(chunks)
}

fn expand_decode_times(stts: &SttsBox, samples: &mut [Sample]) -> Result<()> {
    let bad = |reason: String| Mp4Error::malformed_span(*b"stts", &stts.span, reason);

    let mut clock: u32 = 0;
    let mut index = 0usize;
    for run in &stts.entries {
        let end = index + run.sample_count as usize;
        if end > samples.len() {
            return Err(bad(format!(
                "runs cover at least {} samples but the track has {}",
                end,
                samples.len()
            )));
        }
        for sample in &mut samples[index..end] {
            sample.start_time = clock;
            sample.duration = run.sample_delta;
            clock = clock
                .checked_add(run.sample_delta)
                .ok_or_else(|| bad(format!("decode clock overflows 32 bits at sample {}", index + 1)))?;
            index += 1;
        }
    }

    if index < samples.len() {
        warn!(
            "stts covers {} of {} samples, the rest get a zero duration",
            index,
            samples.len()
        );
        for sample in &mut samples[index..] {
            sample.start_time = clock;
        }
    }
    Ok(())
}

fn expand_composition_offsets(ctts: &CttsBox, samples: &mut [Sample]) {
    let covered: u64 = ctts.entries.iter().map(|e| e.sample_count as u64).sum();
    if covered > samples.len() as u64 {
        warn!(
            "Ignoring ctts: runs cover {} samples but the track has {}",
            covered,
            samples.len()
        );
        return;
    }

    let mut index = 0usize;
    for run in &ctts.entries {
        for sample in &mut samples[index..index + run.sample_count as usize] {
            sample.composition_offset = run.sample_offset;
        }
        index += run.sample_count as usize;
    }
}

fn mark_sync_samples(stss: &StssBox, samples: &mut [Sample]) {
    let valid = stss.sample_numbers.windows(2).all(|w| w[0] < w[1])
        && stss
            .sample_numbers
            .iter()
            .all(|&n| n >= 1 && n as usize <= samples.len());
    if !valid {
        warn!("Ignoring stss: sample numbers are out of range or not ascending");
        return;
    }

    for sample in samples.iter_mut() {
        sample.is_sync = false;
    }
    for &number in &stss.sample_numbers {
        samples[number as usize - 1].is_sync = true;
    }
}

fn resolve_offsets(offsets: &ChunkOffsets, chunks: &[Chunk], samples: &mut [Sample]) -> Result<()> {
    for (number, chunk) in chunks.iter().enumerate().filter(|(_, c)| c.sample_count > 0) {
        let first = chunk.start_sample_index as usize - 1;
        let mut offset = Some(chunk.offset);
        for sample in &mut samples[first..first + chunk.sample_count as usize] {
            sample.offset = offset.ok_or_else(|| {
                Mp4Error::malformed_span(
                    offsets.box_type,
                    offsets.span,
                    format!("samples of chunk {} run past the 64-bit offset range", number + 1),
                )
            })?;
            offset = sample.offset.checked_add(sample.size as u64);
        }
    }
    Ok(())
}

fn check_media_data(offsets: &ChunkOffsets, media_data: &[MdatBox], samples: &[Sample]) -> Result<()> {
    let outside = samples
        .iter()
        .enumerate()
        .find(|(_, s)| s.size > 0 && !media_data.iter().any(|m| m.contains(s.offset, s.size as u64)));
    match outside {
        Some((i, sample)) => Err(Mp4Error::malformed_span(
            offsets.box_type,
            offsets.span,
            format!(
                "sample {} ({} bytes at offset {}) lies outside every mdat payload",
                i + 1,
                sample.size,
                sample.offset
            ),
        )),
        None => Ok(()),
    }
}
