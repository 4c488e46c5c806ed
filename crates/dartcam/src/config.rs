//! On-disk pipeline configuration.

use crate::pipeline::PipelineParams;
use dartcam_board::BoardGeometry;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a run needs besides the frame source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ring snapshot written by the calibration tool.
    pub rings: Option<PathBuf>,
    /// Sector snapshot written by the calibration tool.
    pub sectors: Option<PathBuf>,
    pub params: PipelineParams,
    /// Where to write the debug image of the last accepted strike.
    pub debug_artifact: Option<PathBuf>,
    /// Capacity of the control and event queues.
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rings: Some(PathBuf::from("rings.json")),
            sectors: Some(PathBuf::from("sectors.json")),
            params: PipelineParams::default(),
            debug_artifact: None,
            queue_capacity: 64,
        }
    }
}

impl PipelineConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Board geometry for a `width × height` capture, falling back to the
    /// uncalibrated default when the snapshot is missing or unusable.
    pub fn load_geometry(&self, width: u32, height: u32) -> BoardGeometry {
        match (&self.rings, &self.sectors) {
            (Some(rings), Some(sectors)) => {
                BoardGeometry::load_or_default(rings, sectors, width, height)
            }
            _ => {
                warn!("no geometry snapshot configured; scoring against an uncalibrated layout");
                BoardGeometry::default_for_frame(width, height)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dartcam_detect::TipStrategy;

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dartcam.json");
        let mut cfg = PipelineConfig::default();
        cfg.params.motion.motion_threshold = 25;
        cfg.params.tip = TipStrategy::OrientedRect;
        cfg.debug_artifact = Some(dir.path().join("last.png"));
        cfg.write_json(&path).expect("write");
        assert_eq!(PipelineConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn sparse_config_fills_in_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"params": {"registry": {"min_separation": 12.0}}}"#)
                .expect("parse");
        assert_eq!(cfg.params.registry.min_separation, 12.0);
        assert_eq!(cfg.params.motion.still_time_secs, 0.4);
        assert_eq!(cfg.rings, Some(PathBuf::from("rings.json")));
    }

    #[test]
    fn missing_snapshot_gives_uncalibrated_geometry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = PipelineConfig {
            rings: Some(dir.path().join("rings.json")),
            sectors: Some(dir.path().join("sectors.json")),
            ..PipelineConfig::default()
        };
        let g = cfg.load_geometry(640, 480);
        assert!(!g.is_calibrated());
        assert_eq!(g, BoardGeometry::default_for_frame(640, 480));
    }
}
