// File: args.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mp4_demux::{extract::DEFAULT_QUEUE_CAPACITY, NalFraming};
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
pub enum LogLevel {
    Trace = 0, // Every NAL unit and box
    Debug = 1, // Per-track and per-box details
    Info = 2, // Progress and totals
    Warn = 3, // Recoverable problems in the input
    Error = 4, // Failures only
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = "Extracts H.264 video from MP4 files as an Annex-B elementary stream.")]
pub struct Args {
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Writes the parameter sets and every sample of a track as Annex-B
    Extract {
        input: PathBuf,
        /// Output file, standard output when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Track to extract, the first H.264 track when omitted
        #[arg(short, long)]
        track: Option<u32>,
        /// Fail on NAL lengths that overrun their sample instead of clamping them
        #[arg(long, action = clap::ArgAction::SetTrue)]
        strict: bool,
        /// Samples buffered between the reader and the writer
        #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
        queue_capacity: usize,
        /// Extract without SPS/PPS when the track's avcC is missing or unreadable
        #[arg(long, action = clap::ArgAction::SetTrue)]
        allow_missing_parameter_sets: bool,
    },
    /// Prints the movie header, the tracks and their sample tables
    Info {
        input: PathBuf,
        /// Also list every sample
        #[arg(short, long, action = clap::ArgAction::SetTrue)]
        samples: bool,
    },
    /// Converts a raw length-prefixed NAL unit stream to Annex-B
    Reframe {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Width in bytes of the length fields
        #[arg(long, default_value = "4", value_parser = clap::value_parser!(u8).range(1..=4))]
        nal_length_size: u8,
        #[arg(long, action = clap::ArgAction::SetTrue)]
        strict: bool,
    },
}

pub fn framing(strict: bool) -> NalFraming {
    if strict {
        NalFraming::Strict
    } else {
        NalFraming::Lenient
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}

pub fn get_log_level_filter(args: &Args) -> LevelFilter {
    // Map the LogLevel enum to the LevelFilter enum
    match args.log_level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_defaults() {
        let args = Args::try_parse_from(["h264-extractor", "extract", "in.mp4"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Info);
        match args.command {
            Command::Extract { input, output, track, strict, queue_capacity, allow_missing_parameter_sets } => {
                assert_eq!(input, PathBuf::from("in.mp4"));
                assert_eq!(output, None);
                assert_eq!(track, None);
                assert!(!strict);
                assert_eq!(queue_capacity, 32);
                assert!(!allow_missing_parameter_sets);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn extract_flags() {
        let args = Args::try_parse_from([
            "h264-extractor", "extract", "in.mp4", "-o", "out.h264", "--track", "2", "--strict",
            "--queue-capacity", "4", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(get_log_level_filter(&args), LevelFilter::DEBUG);
        match args.command {
            Command::Extract { output, track, strict, queue_capacity, .. } => {
                assert_eq!(output, Some(PathBuf::from("out.h264")));
                assert_eq!(track, Some(2));
                assert_eq!(framing(strict), NalFraming::Strict);
                assert_eq!(queue_capacity, 4);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn reframe_rejects_bad_length_size() {
        assert!(Args::try_parse_from(["h264-extractor", "reframe", "in.bin", "--nal-length-size", "5"]).is_err());
        let args = Args::try_parse_from(["h264-extractor", "reframe", "in.bin", "--nal-length-size", "2"]).unwrap();
        assert!(matches!(args.command, Command::Reframe { nal_length_size: 2, .. }));
    }
}
