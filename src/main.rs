use clap::{Arg, Command, value_parser};
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;
use std::{panic, process};

pub mod convert;
pub mod display;
pub mod pipeline;
pub mod source;
pub mod utils;

use crate::convert::GrayscaleConverter;
use crate::display::{AsciiSink, FrameSink, NullSink};
use crate::pipeline::{PipelineConfig, PipelineCoordinator};
use crate::source::{FrameSource, RawFileSource, SyntheticSource};

fn main() {
    tracing_subscriber::fmt::init();

    let matches = Command::new("frameflow")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Raw RGB24 video file to play; omit to use the synthetic source.")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Frame width of the input file (and of synthetic frames).")
                .value_parser(value_parser!(u32))
                .default_value("320"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Frame height of the input file (and of synthetic frames).")
                .value_parser(value_parser!(u32))
                .default_value("240"),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames the synthetic source generates.")
                .value_parser(value_parser!(u64))
                .default_value("240"),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("RATE")
                .help("Target playback rate in frames per second.")
                .value_parser(value_parser!(u32).range(1..=240))
                .default_value("24"),
        )
        .arg(
            Arg::new("queue-capacity")
                .short('q')
                .long("queue-capacity")
                .value_name("ITEMS")
                .help("Maximum buffered frames per inter-stage queue.")
                .value_parser(value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            Arg::new("sink")
                .long("sink")
                .value_name("KIND")
                .help("Where frames go: 'ascii' renders to the terminal, 'null' discards.")
                .value_parser(["ascii", "null"])
                .default_value("ascii"),
        )
        .get_matches();

    // Kill the process as soon as any secondary thread panics; a dead stage
    // would otherwise leave its neighbors blocked on a queue forever.
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(105);
    }));

    let width = *matches.get_one::<u32>("width").unwrap();
    let height = *matches.get_one::<u32>("height").unwrap();
    let fps = *matches.get_one::<u32>("fps").unwrap();

    let source: Box<dyn FrameSource> = match matches.get_one::<PathBuf>("input") {
        Some(path) => match RawFileSource::open(path, width, height) {
            Ok(source) => {
                info!("Playing {} ({}x{})", path.display(), width, height);
                Box::new(source)
            }
            Err(e) => {
                error!("{:#}", e);
                process::exit(2);
            }
        },
        None => {
            let frames = *matches.get_one::<u64>("frames").unwrap();
            info!("Playing {} synthetic frames ({}x{})", frames, width, height);
            Box::new(SyntheticSource::new(width, height, frames))
        }
    };

    let sink: Box<dyn FrameSink> = match matches.get_one::<String>("sink").unwrap().as_str() {
        "null" => Box::new(NullSink::new()),
        _ => Box::new(AsciiSink::stdout(80, 24)),
    };

    let config = PipelineConfig {
        queue_capacity: *matches.get_one::<usize>("queue-capacity").unwrap(),
        frame_interval: Duration::from_micros(1_000_000 / fps as u64),
    };

    let mut pipeline =
        PipelineCoordinator::new(config, source, Box::new(GrayscaleConverter), sink);

    // SIGINT/SIGTERM requests the same early stop a sink quit would.
    let stop = pipeline.stop_signal();
    if let Err(e) = ctrlc::set_handler(move || stop.trigger()) {
        error!("Failed to set signal handler: {}", e);
    }

    match pipeline.run() {
        Ok(report) if report.is_success() => {
            info!("Done: {}", report.health);
        }
        Ok(report) => {
            error!("Finished with failures: {}", report);
            process::exit(1);
        }
        Err(e) => {
            error!("Pipeline error: {:#}", e);
            process::exit(1);
        }
    }
}
