//! Board-plane registration from the four corner fiducials.
//!
//! Markers 0..=3 are glued around the board. When all four are visible the
//! board rectangle `(0,0) (W,0) (W,H) (0,H)` is mapped onto marker 0's
//! corner 0, marker 1's corner 1, marker 3's corner 2 and marker 2's corner
//! 3, in that order. The transform is refreshed at most once per debounce
//! interval and survives frames where markers are occluded.

use crate::params::FiducialParams;
use dartcam_aruco::{DetectedMarker, DictionaryError, MarkerDetector};
use dartcam_core::{homography_from_4pt, GrayImage, Homography};
use log::{debug, info};
use nalgebra::Point2;
use std::time::Instant;

/// Marker id and corner index for each board rectangle corner.
const CORNER_SOURCES: [(u32, usize); 4] = [(0, 0), (1, 1), (3, 2), (2, 3)];

#[derive(thiserror::Error, Debug)]
pub enum FiducialError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error("board-to-camera transform is not invertible")]
    Singular,
}

/// Current board/camera mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiducialTransform {
    pub board_to_camera: Homography,
    pub camera_to_board: Homography,
    pub refreshed_at: Instant,
}

impl FiducialTransform {
    pub fn new(board_to_camera: Homography, refreshed_at: Instant) -> Result<Self, FiducialError> {
        let camera_to_board = board_to_camera.inverse().ok_or(FiducialError::Singular)?;
        Ok(Self {
            board_to_camera,
            camera_to_board,
            refreshed_at,
        })
    }
}

/// Board corner targets picked from a marker set, or `None` unless all four
/// fiducials are present.
pub fn board_corner_targets(markers: &[DetectedMarker]) -> Option<[Point2<f32>; 4]> {
    let mut out = [Point2::origin(); 4];
    for (slot, &(id, corner)) in out.iter_mut().zip(CORNER_SOURCES.iter()) {
        *slot = markers.iter().find(|m| m.id == id)?.corners[corner];
    }
    Some(out)
}

#[derive(Clone, Debug)]
pub struct FiducialTracker {
    params: FiducialParams,
    detector: MarkerDetector,
    current: Option<FiducialTransform>,
}

impl FiducialTracker {
    pub fn new(params: FiducialParams) -> Result<Self, FiducialError> {
        let detector = MarkerDetector::board_markers(params.marker.clone())?;
        Ok(Self {
            params,
            detector,
            current: None,
        })
    }

    /// Tracker that starts out with a known board-to-camera transform.
    pub fn with_transform(
        params: FiducialParams,
        board_to_camera: Homography,
        now: Instant,
    ) -> Result<Self, FiducialError> {
        let mut tracker = Self::new(params)?;
        tracker.current = Some(FiducialTransform::new(board_to_camera, now)?);
        Ok(tracker)
    }

    pub fn params(&self) -> &FiducialParams {
        &self.params
    }

    pub fn set_debounce(&mut self, secs: f64) {
        self.params.debounce_secs = secs;
    }

    pub fn transform(&self) -> Option<&FiducialTransform> {
        self.current.as_ref()
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    fn refresh_due(&self, now: Instant) -> bool {
        match &self.current {
            None => true,
            Some(t) => {
                now.saturating_duration_since(t.refreshed_at).as_secs_f64()
                    >= self.params.debounce_secs
            }
        }
    }

    fn board_rect(&self, frame: &GrayImage) -> [Point2<f32>; 4] {
        let (w, h) = self
            .params
            .board_size
            .unwrap_or((frame.width as f32, frame.height as f32));
        [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    /// Look for the fiducials in `frame` and refresh the transform if due.
    /// Returns whether the transform was replaced.
    pub fn observe(&mut self, frame: &GrayImage, now: Instant) -> bool {
        if !self.refresh_due(now) {
            return false;
        }
        let markers = self.detector.detect(&frame.view());
        let Some(targets) = board_corner_targets(&markers) else {
            debug!(
                "fiducials incomplete: saw {:?}",
                markers.iter().map(|m| m.id).collect::<Vec<_>>()
            );
            return false;
        };

        let board = self.board_rect(frame);
        let transform = homography_from_4pt(&board, &targets)
            .and_then(|h| FiducialTransform::new(h, now).ok());
        match transform {
            Some(t) => {
                if self.current.is_none() {
                    info!("board registered from fiducials");
                }
                self.current = Some(t);
                true
            }
            None => {
                debug!("degenerate fiducial layout {targets:?}; keeping previous transform");
                false
            }
        }
    }

    /// Board-plane point in camera pixels.
    pub fn to_camera_plane(&self, p: Point2<f32>) -> Option<Point2<f32>> {
        self.current.map(|t| t.board_to_camera.apply(p))
    }

    /// Camera pixel on the board plane.
    pub fn to_board_plane(&self, p: Point2<f32>) -> Option<Point2<f32>> {
        self.current.map(|t| t.camera_to_board.apply(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use std::time::Duration;

    fn marker(id: u32, origin: (f32, f32)) -> DetectedMarker {
        let (x, y) = origin;
        DetectedMarker {
            id,
            corners: [
                Point2::new(x, y),
                Point2::new(x + 10.0, y),
                Point2::new(x + 10.0, y + 10.0),
                Point2::new(x, y + 10.0),
            ],
            hamming: 0,
            score: 1.0,
        }
    }

    #[test]
    fn corner_targets_use_the_fixed_marker_corners() {
        let markers = [
            marker(0, (0.0, 0.0)),
            marker(1, (90.0, 0.0)),
            marker(2, (0.0, 90.0)),
            marker(3, (90.0, 90.0)),
        ];
        let t = board_corner_targets(&markers).expect("all four");
        assert_eq!(t[0], Point2::new(0.0, 0.0));
        assert_eq!(t[1], Point2::new(100.0, 0.0));
        assert_eq!(t[2], Point2::new(100.0, 100.0));
        assert_eq!(t[3], Point2::new(0.0, 100.0));

        assert!(board_corner_targets(&markers[..3]).is_none());
    }

    #[test]
    fn points_round_trip_between_planes() {
        let h = Homography::new(Matrix3::new(
            0.9, 0.05, 40.0, //
            -0.03, 1.1, 25.0, //
            0.0004, 0.0002, 1.0,
        ));
        let tracker =
            FiducialTracker::with_transform(FiducialParams::default(), h, Instant::now())
                .expect("tracker");
        let p = Point2::new(123.0, 321.0);
        let cam = tracker.to_camera_plane(p).expect("transform");
        let back = tracker.to_board_plane(cam).expect("transform");
        assert!((back - p).norm() < 1e-2);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let h = Homography::new(Matrix3::zeros());
        assert!(matches!(
            FiducialTracker::with_transform(FiducialParams::default(), h, Instant::now()),
            Err(FiducialError::Singular)
        ));
    }

    #[test]
    fn no_transform_until_markers_are_seen() {
        let mut tracker = FiducialTracker::new(FiducialParams::default()).expect("tracker");
        let frame = GrayImage::filled(120, 90, 200);
        assert!(!tracker.observe(&frame, Instant::now()));
        assert!(tracker.transform().is_none());
        assert!(tracker.to_board_plane(Point2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn debounce_skips_refresh() {
        let now = Instant::now();
        let mut tracker =
            FiducialTracker::with_transform(FiducialParams::default(), Homography::identity(), now)
                .expect("tracker");
        assert!(!tracker.refresh_due(now + Duration::from_secs(1)));
        assert!(tracker.refresh_due(now + Duration::from_secs(3)));
        tracker.set_debounce(0.5);
        assert!(tracker.refresh_due(now + Duration::from_secs(1)));
        tracker.reset();
        assert!(tracker.transform().is_none());
    }
}
