//! dartcam CLI: run strike detection over a camera or a frame directory, or
//! classify a single point against a geometry snapshot.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dartcam::capture::{FrameSource, ImageDirSource};
use dartcam::events::json_lines_writer;
use dartcam::{BoardGeometry, ControlCommand, DetectionPipeline, PipelineConfig, SessionHandle};
use log::{info, warn, LevelFilter};
use nalgebra::Point2;
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dartcam")]
#[command(about = "Detect and score dart strikes from a fixed camera")]
#[command(version)]
struct Cli {
    /// Log more (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON lines (feature `tracing`).
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detection loop and print one JSON line per strike.
    Run(RunArgs),

    /// Classify a board-plane point and print the zone as JSON.
    Classify(ClassifyArgs),

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Directory of frame images, replayed in name order. Takes precedence
    /// over --camera.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Camera index.
    #[cfg(feature = "camera")]
    #[arg(long)]
    camera: Option<u32>,

    /// Pipeline configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ring snapshot; overrides the config.
    #[arg(long)]
    rings: Option<PathBuf>,

    /// Sector snapshot; overrides the config.
    #[arg(long)]
    sectors: Option<PathBuf>,

    /// Motion threshold (0-255).
    #[arg(long)]
    threshold: Option<u8>,

    /// Quiet time before a frame is analysed, in seconds.
    #[arg(long)]
    still: Option<f64>,

    /// Replay frame rate for --frames; timestamps follow the wall clock when
    /// omitted.
    #[arg(long)]
    fps: Option<f64>,

    /// Write a debug image of the last accepted strike here.
    #[arg(long)]
    debug_image: Option<PathBuf>,

    /// Do not read control commands from stdin.
    #[arg(long)]
    no_control: bool,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    #[arg(long)]
    x: f32,

    #[arg(long)]
    y: f32,

    /// Ring snapshot. Without both snapshots the uncalibrated layout for
    /// --width x --height is used.
    #[arg(long, requires = "sectors")]
    rings: Option<PathBuf>,

    #[arg(long, requires = "rings")]
    sectors: Option<PathBuf>,

    #[arg(long, default_value = "640")]
    width: u32,

    #[arg(long, default_value = "480")]
    height: u32,
}

#[derive(Serialize)]
struct ClassifyOutput {
    x: f32,
    y: f32,
    zone: dartcam::Zone,
    label: String,
    code: String,
    points: u32,
    calibrated: bool,
}

fn init_logging(verbose: u8, json: bool) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    #[cfg(feature = "tracing")]
    dartcam::core::init_tracing(level, json);
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--json-log needs the `tracing` feature; using plain logs");
        }
        let _ = dartcam::core::init_with_level(level);
    }
}

/// Forward stdin lines as control commands until stdin closes or the
/// pipeline stops listening.
fn spawn_stdin_control(handle: SessionHandle) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let cmd = match line.parse::<ControlCommand>() {
                Ok(cmd) => cmd,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };
            if let Err(e) = handle.send(cmd) {
                warn!("{e}");
                if matches!(e, dartcam::session::SessionError::Closed) {
                    break;
                }
            }
        }
    });
}

fn open_source(args: &RunArgs) -> Result<Box<dyn FrameSource>> {
    if let Some(dir) = &args.frames {
        let mut source = ImageDirSource::open(dir)
            .with_context(|| format!("failed to open frames in {}", dir.display()))?;
        if let Some(fps) = args.fps {
            if !(fps.is_finite() && fps > 0.0) {
                bail!("--fps must be positive, got {fps}");
            }
            source = source.with_frame_interval(Duration::from_secs_f64(1.0 / fps));
        }
        return Ok(Box::new(source));
    }
    #[cfg(feature = "camera")]
    if let Some(index) = args.camera {
        let source = dartcam::capture::CameraSource::open(index)
            .with_context(|| format!("failed to open camera {index}"))?;
        return Ok(Box::new(source));
    }
    bail!("no frame source; pass --frames DIR or --camera N")
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_json(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.rings.is_some() {
        config.rings = args.rings.clone();
    }
    if args.sectors.is_some() {
        config.sectors = args.sectors.clone();
    }
    if let Some(t) = args.threshold {
        config.params.motion.motion_threshold = t;
    }
    if let Some(s) = args.still {
        config.params.motion.still_time_secs = s;
    }
    if args.debug_image.is_some() {
        config.debug_artifact = args.debug_image.clone();
    }

    let mut source = open_source(&args)?;
    let (w, h) = source
        .resolution()
        .context("frame source did not report a resolution")?;
    let geometry = config.load_geometry(w, h);
    let mut pipeline = DetectionPipeline::new(config.params.clone(), geometry)
        .context("invalid pipeline parameters")?;
    if let Some(path) = &config.debug_artifact {
        pipeline = pipeline.with_debug_artifact(path);
    }
    if !args.no_control {
        spawn_stdin_control(pipeline.session(config.queue_capacity));
    }

    let (mut sink, writer) = json_lines_writer(io::stdout(), config.queue_capacity);
    let result = pipeline.run(source.as_mut(), &mut sink);
    if sink.dropped() > 0 {
        warn!("{} strike events dropped on a full output queue", sink.dropped());
    }
    drop(sink);
    writer
        .join()
        .map_err(|_| anyhow!("event writer thread panicked"))?;
    let summary = result.context("detection loop failed")?;
    info!(
        "{} frames, {} strikes, stopped: {:?}",
        summary.frames, summary.strikes, summary.stop
    );
    Ok(())
}

fn classify(args: ClassifyArgs) -> Result<()> {
    let geometry = match (&args.rings, &args.sectors) {
        (Some(rings), Some(sectors)) => BoardGeometry::load_json(rings, sectors)
            .context("failed to load geometry snapshot")?,
        _ => BoardGeometry::default_for_frame(args.width, args.height),
    };
    let calibrated = geometry.is_calibrated();
    let zone = dartcam::ZoneClassifier::new(geometry).classify(Point2::new(args.x, args.y));
    let out = ClassifyOutput {
        x: args.x,
        y: args.y,
        zone,
        label: zone.label(),
        code: zone.code(),
        points: zone.points(),
        calibrated,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_log);
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Classify(args) => classify(args),
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
            Ok(())
        }
    }
}
