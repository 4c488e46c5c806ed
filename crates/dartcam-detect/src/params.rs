use dartcam_aruco::MarkerDetectorParams;
use serde::{Deserialize, Serialize};

/// Rejected parameter values.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be positive and finite (got {value})")]
    NotPositive { name: &'static str, value: f64 },
    #[error("min_samples must be at least 1")]
    NoSamples,
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

/// Frame differencing and stability gating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Gaussian kernel side (odd). Sigma is derived from it.
    pub blur_kernel: usize,
    /// A blurred pixel is moving when it differs from the background by more
    /// than this.
    pub motion_threshold: u8,
    pub dilate_iterations: usize,
    pub erode_iterations: usize,
    /// Radius of the disc masked out around each accepted strike.
    pub known_strike_radius: f32,
    /// Length of the motion-level history, in seconds.
    pub window_secs: f64,
    /// How long the motion level has to stay flat before analysis.
    pub still_time_secs: f64,
    /// Largest level spread (max - min) still counted as quiet.
    pub max_jump: usize,
    /// Samples needed in the window before the spread is trusted.
    pub min_samples: usize,
    /// Levels above this replace the background and forget all strikes.
    pub disturbance_level: usize,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            blur_kernel: 9,
            motion_threshold: 13,
            dilate_iterations: 2,
            erode_iterations: 1,
            known_strike_radius: 12.0,
            window_secs: 0.5,
            still_time_secs: 0.4,
            max_jump: 60,
            min_samples: 3,
            disturbance_level: 10_000,
        }
    }
}

impl MotionParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        positive("window_secs", self.window_secs)?;
        if !(self.still_time_secs.is_finite() && self.still_time_secs >= 0.0) {
            return Err(ParamsError::NotPositive {
                name: "still_time_secs",
                value: self.still_time_secs,
            });
        }
        if self.min_samples == 0 {
            return Err(ParamsError::NoSamples);
        }
        Ok(())
    }
}

/// Contour filtering and proximity grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Contours enclosing less than this many square pixels are noise.
    pub min_blob_area: f64,
    /// Contours closer than this (nearest points, pixels) share a group.
    pub proximity_px: f32,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            min_blob_area: 50.0,
            proximity_px: 70.0,
        }
    }
}

/// Strike deduplication.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryParams {
    /// Minimum camera-plane distance between two accepted strikes.
    pub min_separation: f32,
}

impl Default for RegistryParams {
    fn default() -> Self {
        Self {
            min_separation: 30.0,
        }
    }
}

/// Board fiducial tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiducialParams {
    /// Minimum time between two homography refreshes.
    pub debounce_secs: f64,
    /// Board-plane rectangle `(width, height)` the markers span. `None`
    /// uses the size of the frame being observed.
    pub board_size: Option<(f32, f32)>,
    pub marker: MarkerDetectorParams,
}

impl Default for FiducialParams {
    fn default() -> Self {
        Self {
            debounce_secs: 3.0,
            board_size: None,
            marker: MarkerDetectorParams::default(),
        }
    }
}
