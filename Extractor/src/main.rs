use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use h264_extractor::args::{framing, get_log_level_filter, parse_args, Command};
use h264_extractor::info::print_info;
use mp4_demux::{
    annexb::reframe, extract_annexb, CodecConfig, Demuxer, ExtractOptions, ExtractPlan, Mp4Error,
};
use tokio::io::{AsyncWrite, BufWriter as AsyncBufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    // Build the FmtSubscriber layer. Logs go to stderr, stdout may carry the stream.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_filter(get_log_level_filter(&args));
    let subscriber = tracing_subscriber::registry().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{:?}", args);

    let result = match args.command {
        Command::Extract { input, output, track, strict, queue_capacity, allow_missing_parameter_sets } => {
            let options = ExtractOptions { queue_capacity, framing: framing(strict) };
            extract(&input, output, track, options, allow_missing_parameter_sets).await
        }
        Command::Info { input, samples } => {
            Demuxer::open(&input).and_then(|demuxer| print_info(&demuxer, samples))
        }
        Command::Reframe { input, output, nal_length_size, strict } => {
            reframe_file(input, output, nal_length_size, strict).await
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn extract(
    input: &Path,
    output: Option<PathBuf>,
    track: Option<u32>,
    options: ExtractOptions,
    allow_missing_parameter_sets: bool,
) -> mp4_demux::Result<()> {
    let demuxer = Demuxer::open(input)?;
    let plan = match demuxer.plan(track) {
        Err(Mp4Error::MalformedConfiguration(reason)) if allow_missing_parameter_sets => {
            warn!("Ignoring the codec configuration ({}), extracting without SPS/PPS", reason);
            let trak = match track {
                Some(id) => demuxer.track(id)?,
                None => demuxer.default_track()?,
            };
            ExtractPlan::with_config(trak, CodecConfig::default())?
        }
        plan => plan?,
    };
    info!("Extracting track {} ({} samples)", plan.track_id, plan.samples.len());

    let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &output {
        Some(path) => Box::new(AsyncBufWriter::new(tokio::fs::File::create(path).await?)),
        None => Box::new(AsyncBufWriter::new(tokio::io::stdout())),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping extraction");
            on_interrupt.cancel();
        }
    });

    let (source, _) = demuxer.into_parts();
    let report = extract_annexb(source, plan, &mut writer, &options, cancel).await?;
    info!(
        "Done: {} samples, {} parameter sets, {} NAL units ({} clamped), {} bytes{}",
        report.samples,
        report.parameter_sets,
        report.nal_units,
        report.truncated_nal_units,
        report.bytes_written,
        if report.cancelled { ", cancelled" } else { "" }
    );
    Ok(())
}

async fn reframe_file(
    input: PathBuf,
    output: Option<PathBuf>,
    nal_length_size: u8,
    strict: bool,
) -> mp4_demux::Result<()> {
    let report = tokio::task::spawn_blocking(move || -> mp4_demux::Result<_> {
        let mut reader = BufReader::new(File::open(&input)?);
        match output {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(path)?);
                reframe(&mut reader, &mut writer, nal_length_size, framing(strict))
            }
            None => {
                let mut writer = BufWriter::new(std::io::stdout().lock());
                reframe(&mut reader, &mut writer, nal_length_size, framing(strict))
            }
        }
    })
    .await
    .map_err(|e| Mp4Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    info!(
        "Reframed {} NAL units ({} clamped), {} bytes",
        report.nal_units, report.truncated_nal_units, report.bytes_written
    );
    Ok(())
}
