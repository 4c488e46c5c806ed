//! Per-frame strike detection and scoring.
//!
//! [`DetectionPipeline`] owns every stage of one session (motion analyzer,
//! clusterer, tip estimator, strike registry, fiducial tracker, zone
//! classifier) and runs them serially on each frame.

mod detection;
mod error;
mod params;
mod result;

pub use detection::DetectionPipeline;
pub use error::{CaptureError, PipelineError};
pub use params::PipelineParams;
pub use result::{FrameReport, RunSummary, StopReason, StrikeEvent};
