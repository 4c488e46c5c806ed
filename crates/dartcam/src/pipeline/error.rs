use dartcam_core::ImageBufferError;
use dartcam_detect::{FiducialError, ParamsError};
use std::path::PathBuf;

/// Errors raised by frame sources.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("failed to open capture device: {0}")]
    Open(String),
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no image files in {0}")]
    Empty(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors returned by the detection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("first frame could not be read: {0}")]
    FirstFrame(#[source] CaptureError),
    #[error("frame source produced no frames")]
    NoFrames,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Frame(#[from] ImageBufferError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Fiducial(#[from] FiducialError),
}
