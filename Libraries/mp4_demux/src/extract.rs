//! The extraction pipeline: samples are read and re-framed on a blocking worker and handed
//! to an async writer through a bounded channel.
//!
//! ```text
//!  spawn_blocking                      mpsc (capacity 32)              async task
//!  seek + read sample  ──►  split NAL units  ──► Packet::Sample ──►  write to AsyncWrite
//!                                          └──► Packet::EndOfStream
//! ```
//!
//! The reader owns the source for the whole run. Cancelling the token closes the channel;
//! the reader notices on its next send and stops.

use std::io::{Read, Seek, SeekFrom};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

pub use crate::annexb::NalFraming;
use crate::{
    annexb::{nal_unit_type, nal_unit_type_name, push_unit, split_nal_units},
    avcc::CodecConfig,
    boxes::trak::TrakBox,
    error::{Mp4Error, Result},
    sample_table::Sample,
};

pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Samples buffered between the reader and the writer.
    pub queue_capacity: usize,
    pub framing: NalFraming,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            framing: NalFraming::Lenient,
        }
    }
}

/// Everything the pipeline needs about one track, detached from the parsed file.
#[derive(Debug, Clone)]
pub struct ExtractPlan {
    pub track_id: u32,
    pub samples: Vec<Sample>,
    pub config: CodecConfig,
}

impl ExtractPlan {
    /// Plan for an H.264 video track, using its `avcC` configuration.
    pub fn for_track(trak: &TrakBox) -> Result<Self> {
        if !trak.is_video() {
            return Err(Mp4Error::UnsupportedTrack {
                track_id: trak.track_id(),
                reason: "not a video track".to_string(),
            });
        }
        let config = trak.codec_config()?.clone();
        Self::with_config(trak, config)
    }

    /// Plan for `trak` with a caller-supplied configuration, for tracks whose parameter
    /// sets are missing or travel in-band.
    pub fn with_config(trak: &TrakBox, config: CodecConfig) -> Result<Self> {
        let index = trak.sample_index()?;
        Ok(ExtractPlan {
            track_id: trak.track_id(),
            samples: index.samples.clone(),
            config,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// Samples written out.
    pub samples: u64,
    /// SPS and PPS units written before the first sample.
    pub parameter_sets: u64,
    /// NAL units written from samples.
    pub nal_units: u64,
    pub bytes_written: u64,
    /// NAL units whose declared length overran their sample and were clamped.
    pub truncated_nal_units: u64,
    pub cancelled: bool,
}

enum Packet {
    Sample {
        number: usize,
        annexb: Vec<u8>,
        nal_units: usize,
        truncated: usize,
    },
    EndOfStream,
}

/// Writes the parameter sets of `plan` followed by every sample of it, in storage order,
/// as an Annex-B stream into `writer`.
///
/// Partial output stays in `writer` when an error or a cancellation stops the run.
#[instrument(skip_all, fields(track_id = plan.track_id, samples = plan.samples.len()))]
pub async fn extract_annexb<R, W>(
    source: R,
    plan: ExtractPlan,
    writer: &mut W,
    options: &ExtractOptions,
    cancel: CancellationToken,
) -> Result<ExtractReport>
where
    R: Read + Seek + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let mut report = ExtractReport::default();
    let ExtractPlan { samples, config, .. } = plan;

    let mut parameter_sets = Vec::new();
    for set in config.sps.iter().chain(config.pps.iter()) {
        push_unit(&mut parameter_sets, set);
        report.parameter_sets += 1;
    }
    if parameter_sets.is_empty() {
        warn!("No SPS/PPS in the configuration, the stream must carry them in-band");
    }
    writer.write_all(&parameter_sets).await?;
    report.bytes_written += parameter_sets.len() as u64;

    let (tx, mut rx) = mpsc::channel(options.queue_capacity.max(1));
    let nal_length_size = config.nal_length_size;
    let framing = options.framing;
    let producer = tokio::task::spawn_blocking(move || {
        let mut source = source;
        let result = read_samples(&mut source, &samples, nal_length_size, framing, &tx);
        // The writer stops at this marker; a read error comes back through the join handle.
        let _ = tx.blocking_send(Packet::EndOfStream);
        result
    });

    loop {
        let packet = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Extraction cancelled after {} samples", report.samples);
                report.cancelled = true;
                rx.close();
                break;
            }
            packet = rx.recv() => packet,
        };

        match packet {
            Some(Packet::Sample { number, annexb, nal_units, truncated }) => {
                writer.write_all(&annexb).await?;
                trace!("Sample #{}: {} NAL units, {} bytes", number, nal_units, annexb.len());
                report.samples += 1;
                report.nal_units += nal_units as u64;
                report.truncated_nal_units += truncated as u64;
                report.bytes_written += annexb.len() as u64;
            }
            Some(Packet::EndOfStream) | None => break,
        }
    }
    writer.flush().await?;
    drop(rx);

    producer
        .await
        .map_err(|e| Mp4Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    if report.truncated_nal_units > 0 {
        warn!("{} NAL units were clamped to their sample size", report.truncated_nal_units);
    }
    info!(
        "Wrote {} samples, {} NAL units, {} bytes",
        report.samples, report.nal_units, report.bytes_written
    );
    Ok(report)
}

// Runs on the blocking pool. Returns early without error when the writer side is gone.
fn read_samples<R: Read + Seek>(
    source: &mut R,
    samples: &[Sample],
    nal_length_size: u8,
    framing: NalFraming,
    tx: &mpsc::Sender<Packet>,
) -> Result<()> {
    let mut buffer = Vec::new();
    for (i, sample) in samples.iter().enumerate() {
        let number = i + 1;
        if tx.is_closed() {
            debug!("Writer closed, stopping before sample #{}", number);
            return Ok(());
        }

        buffer.resize(sample.size as usize, 0);
        source.seek(SeekFrom::Start(sample.offset))?;
        source.read_exact(&mut buffer)?;

        let split = split_nal_units(&buffer, nal_length_size, framing, number)?;
        let mut annexb = Vec::with_capacity(buffer.len() + split.units.len() * 4);
        for unit in &split.units {
            trace!(
                "Sample #{}: {} unit, {} bytes",
                number,
                nal_unit_type_name(nal_unit_type(unit[0])),
                unit.len()
            );
            push_unit(&mut annexb, unit);
        }

        let packet = Packet::Sample {
            number,
            annexb,
            nal_units: split.units.len(),
            truncated: split.truncated,
        };
        if tx.blocking_send(packet).is_err() {
            debug!("Writer closed, stopping at sample #{}", number);
            return Ok(());
        }
    }
    Ok(())
}
