use crate::pipeline::CaptureError;
use dartcam_board::Zone;
use dartcam_core::ImageBufferError;
use serde::Serialize;
use std::time::Instant;

/// One accepted strike.
///
/// `board`, `zone` and the derived fields stay `None` while no fiducial
/// transform is known.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrikeEvent {
    /// Index of the frame the strike was found in.
    pub frame: u64,
    /// Strike point in camera pixels.
    pub camera: [f32; 2],
    /// Strike point on the board plane.
    pub board: Option<[f32; 2]>,
    pub zone: Option<Zone>,
    /// Long label, e.g. `"triple 20"`.
    pub label: Option<String>,
    /// Short code, e.g. `"T20"`.
    pub code: Option<String>,
    pub points: Option<u32>,
    /// Whether the zone came from a calibrated geometry.
    pub calibrated: bool,
    #[serde(skip)]
    pub detected_at: Instant,
}

/// What happened on one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub motion_level: usize,
    /// Whether the frame was analysed for a strike.
    pub analyzed: bool,
    pub strikes: Vec<StrikeEvent>,
    /// Large motion reset the background and the known strikes.
    pub disturbed: bool,
    pub fiducials_updated: bool,
}

#[derive(Debug)]
pub enum StopReason {
    /// A `Stop` command was received.
    Requested,
    /// The source ran out of frames.
    Exhausted,
    /// The source failed after the first frame.
    SourceFailed(CaptureError),
    /// A captured frame could not be turned into a gray image.
    FrameFailed(ImageBufferError),
}

/// Totals of one [`run`](crate::DetectionPipeline::run).
#[derive(Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub strikes: usize,
    pub stop: StopReason,
}
