//! Camera-based dart strike detection and scoring.
//!
//! The pipeline watches a fixed camera pointed at a dartboard. It keeps a
//! blurred background frame and waits for motion to settle after a throw. It
//! then finds the dart blob in the difference mask, estimates its tip and
//! maps the tip onto the board plane through a homography taken from four
//! corner fiducials. Each new strike is scored against a calibrated ring and
//! sector geometry.
//!
//! ## Quickstart
//!
//! ```no_run
//! use dartcam::capture::ImageDirSource;
//! use dartcam::{DetectionPipeline, PipelineConfig, StrikeEvent};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let mut source = ImageDirSource::open("frames/")?;
//! let geometry = config.load_geometry(640, 480);
//! let mut pipeline = DetectionPipeline::new(config.params.clone(), geometry)?;
//! let mut strikes: Vec<StrikeEvent> = Vec::new();
//! let summary = pipeline.run(&mut source, &mut strikes)?;
//! println!("{} strikes in {} frames", summary.strikes, summary.frames);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `dartcam::core`: gray buffers, filters, contours, homographies.
//! - `dartcam::aruco`: fiducial marker dictionary and decoding.
//! - `dartcam::board`: ring/sector geometry and zone classification.
//! - `dartcam::detect`: the individual detection stages.
//! - [`DetectionPipeline`]: the stages wired into a per-frame loop.
//! - [`capture`], [`events`], [`session`]: frame sources, strike sinks and
//!   runtime control.

pub use dartcam_aruco as aruco;
pub use dartcam_board as board;
pub use dartcam_core as core;
pub use dartcam_detect as detect;

pub mod capture;
pub mod config;
pub mod debug;
pub mod events;
mod pipeline;
pub mod session;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{
    CaptureError, DetectionPipeline, FrameReport, PipelineError, PipelineParams, RunSummary,
    StopReason, StrikeEvent,
};
pub use session::{control_channel, ControlCommand, SessionHandle};

pub use dartcam_board::{BoardGeometry, Zone, ZoneClassifier};
pub use dartcam_detect::TipStrategy;
