use dartcam_detect::{ClusterParams, FiducialParams, MotionParams, RegistryParams, TipStrategy};
use serde::{Deserialize, Serialize};

/// Tunables of every pipeline stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub motion: MotionParams,
    pub cluster: ClusterParams,
    pub tip: TipStrategy,
    pub registry: RegistryParams,
    pub fiducial: FiducialParams,
}
