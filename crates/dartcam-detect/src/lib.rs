//! Per-frame dart strike detection stages.
//!
//! - [`MotionAnalyzer`]: background differencing with a stability gate that
//!   says when a thrown dart has come to rest.
//! - [`BlobClusterer`]: groups nearby motion blobs into candidate objects.
//! - [`TipEstimator`]: finds the strike point of a blob ([`HullTriangle`],
//!   [`OrientedRect`]).
//! - [`StrikeRegistry`]: remembers accepted strikes and rejects repeats.
//! - [`FiducialTracker`]: keeps the camera-to-board homography up to date
//!   from the four corner markers.
//!
//! The stages are independent; `dartcam::DetectionPipeline` wires them into
//! a loop.

mod cluster;
mod fiducial;
mod motion;
mod params;
mod registry;
mod tip;

pub use cluster::{BlobClusterer, ContourGroup};
pub use fiducial::{board_corner_targets, FiducialError, FiducialTracker, FiducialTransform};
pub use motion::{MotionAnalyzer, MotionEvent, MotionUpdate, StabilityGate};
pub use params::{ClusterParams, FiducialParams, MotionParams, ParamsError, RegistryParams};
pub use registry::{StrikeRecord, StrikeRegistry};
pub use tip::{
    HullTriangle, OrientedRect, TipConstruction, TipEstimate, TipEstimator, TipStrategy,
};
