//! ArUco fiducial detection for the four board markers.
//!
//! Detection runs on a whole grayscale frame:
//! 1. inverted adaptive-mean threshold (dark marker borders become foreground),
//! 2. outer contours simplified to convex quadrilaterals,
//! 3. each quad is mapped from a canonical square and its cells sampled,
//! 4. the bit pattern is matched against the dictionary in all four rotations.
//!
//! ```no_run
//! use dartcam_aruco::{MarkerDetector, MarkerDetectorParams};
//! # fn frame() -> dartcam_core::GrayImage { unimplemented!() }
//! let detector = MarkerDetector::board_markers(MarkerDetectorParams::default())?;
//! let gray = frame();
//! for m in detector.detect(&gray.view()) {
//!     println!("marker {} at {:?}", m.id, m.corners[0]);
//! }
//! # Ok::<(), dartcam_aruco::DictionaryError>(())
//! ```

pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quad;
mod threshold;

pub use decode::DecodeParams;
pub use detector::{DetectedMarker, MarkerDetector, MarkerDetectorParams};
pub use dictionary::Dictionary;
pub use matcher::{rotate_code_u64, DictionaryError, Match, Matcher};
pub use quad::{find_quads, QuadParams};
pub use threshold::adaptive_threshold_inv;
