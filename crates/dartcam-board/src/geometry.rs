//! Ring ellipses and the sector wedge layout of a calibrated board.

use log::warn;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Number of ring ellipses. Index 0 is the outer double wire, 5 the bullseye.
pub const RING_COUNT: usize = 6;

/// Ring radii relative to ring 0 used when no calibration is available.
pub const DEFAULT_RING_RATIOS: [f64; RING_COUNT] = [1.0, 0.85, 0.6, 0.5, 0.15, 0.06];

/// One axis-aligned ellipse in camera or board coordinates.
///
/// Semi-axes are `scale * stretch_x` and `scale * stretch_y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingDescriptor {
    pub cx: f64,
    pub cy: f64,
    pub scale: f64,
    pub stretch_x: f64,
    pub stretch_y: f64,
}

impl RingDescriptor {
    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        Self {
            cx,
            cy,
            scale: radius,
            stretch_x: 1.0,
            stretch_y: 1.0,
        }
    }

    #[inline]
    pub fn semi_axes(&self) -> (f64, f64) {
        (self.scale * self.stretch_x, self.scale * self.stretch_y)
    }

    /// Squared normalised distance: `<= 1` inside or on the ellipse.
    pub fn normalized_sq(&self, p: Point2<f64>) -> f64 {
        let (ax, ay) = self.semi_axes();
        let nx = (p.x - self.cx) / ax;
        let ny = (p.y - self.cy) / ay;
        nx * nx + ny * ny
    }

    /// Inside or on the ellipse.
    #[inline]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        self.normalized_sq(p) <= 1.0
    }

    /// Distance from the centre to the ellipse along `angle` (radians).
    pub fn radius_at(&self, angle: f64) -> f64 {
        let (ax, ay) = self.semi_axes();
        let (s, c) = angle.sin_cos();
        1.0 / ((c / ax).powi(2) + (s / ay).powi(2)).sqrt()
    }

    fn validate(&self, index: usize) -> Result<(), GeometryError> {
        let finite = [self.cx, self.cy, self.scale, self.stretch_x, self.stretch_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeometryError::NonFinite { index });
        }
        if self.scale <= 0.0 || self.stretch_x <= 0.0 || self.stretch_y <= 0.0 {
            return Err(GeometryError::NonPositiveAxis { index });
        }
        Ok(())
    }
}

/// Angular partition: 20 wedges of 18° around ring 0's centre plus offset.
///
/// `scale` and the stretches only shape the drawn sector lines; they do not
/// affect classification.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    /// Degrees, subtracted from the measured angle.
    pub rotation: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub stretch_x: f64,
    pub stretch_y: f64,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            stretch_x: 1.0,
            stretch_y: 1.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("expected {RING_COUNT} rings, got {0}")]
    RingCount(usize),
    #[error("ring {index} has a non-finite value")]
    NonFinite { index: usize },
    #[error("ring {index} must have positive scale and stretch")]
    NonPositiveAxis { index: usize },
    #[error("sector config has a non-finite value")]
    SectorNonFinite,
}

/// Ring ellipses plus sector layout, read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardGeometry {
    rings: [RingDescriptor; RING_COUNT],
    sectors: SectorConfig,
    calibrated: bool,
}

impl BoardGeometry {
    /// Validate a calibrated geometry.
    ///
    /// Rings that are not strictly nested are accepted with a warning; the
    /// classifier then reports whichever pair matches first.
    pub fn new(rings: Vec<RingDescriptor>, sectors: SectorConfig) -> Result<Self, GeometryError> {
        let rings: [RingDescriptor; RING_COUNT] = rings
            .try_into()
            .map_err(|v: Vec<RingDescriptor>| GeometryError::RingCount(v.len()))?;
        for (i, r) in rings.iter().enumerate() {
            r.validate(i)?;
        }
        let s = &sectors;
        if ![s.rotation, s.offset_x, s.offset_y, s.scale, s.stretch_x, s.stretch_y]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(GeometryError::SectorNonFinite);
        }

        let geometry = Self {
            rings,
            sectors,
            calibrated: true,
        };
        if let Some(i) = geometry.first_nesting_violation() {
            warn!("ring {} does not strictly enclose ring {}", i, i + 1);
        }
        Ok(geometry)
    }

    /// Uncalibrated fallback: concentric circles centred in a `width × height`
    /// frame, ring 0 at 40% of the shorter side, inner rings at
    /// [`DEFAULT_RING_RATIOS`].
    pub fn default_for_frame(width: u32, height: u32) -> Self {
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        let base = 0.4 * width.min(height).max(1) as f64;
        Self {
            rings: DEFAULT_RING_RATIOS.map(|r| RingDescriptor::circle(cx, cy, base * r)),
            sectors: SectorConfig::default(),
            calibrated: false,
        }
    }

    #[inline]
    pub fn rings(&self) -> &[RingDescriptor; RING_COUNT] {
        &self.rings
    }

    #[inline]
    pub fn sectors(&self) -> &SectorConfig {
        &self.sectors
    }

    /// `false` when this is the fallback layout.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub(crate) fn mark_uncalibrated(mut self) -> Self {
        self.calibrated = false;
        self
    }

    /// Origin of the sector angles: ring 0 centre shifted by the sector offset.
    pub fn sector_origin(&self) -> Point2<f64> {
        Point2::new(
            self.rings[0].cx + self.sectors.offset_x,
            self.rings[0].cy + self.sectors.offset_y,
        )
    }

    /// First `i` where ring `i` does not strictly enclose ring `i + 1`,
    /// checked at sampled points of the inner ellipse.
    pub fn first_nesting_violation(&self) -> Option<usize> {
        const SAMPLES: usize = 72;
        (0..RING_COUNT - 1).find(|&i| {
            let (outer, inner) = (&self.rings[i], &self.rings[i + 1]);
            (0..SAMPLES).any(|k| {
                let a = k as f64 * std::f64::consts::TAU / SAMPLES as f64;
                let r = inner.radius_at(a);
                let p = Point2::new(inner.cx + r * a.cos(), inner.cy + r * a.sin());
                outer.normalized_sq(p) >= 1.0 - 1e-9
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn concentric(scales: [f64; 6]) -> Vec<RingDescriptor> {
        scales
            .iter()
            .map(|&s| RingDescriptor::circle(250.0, 250.0, s))
            .collect()
    }

    #[test]
    fn rejects_wrong_ring_count() {
        let rings = concentric([80.0, 68.0, 48.0, 44.0, 12.0, 5.0])[..5].to_vec();
        assert_eq!(
            BoardGeometry::new(rings, SectorConfig::default()),
            Err(GeometryError::RingCount(5))
        );
    }

    #[test]
    fn rejects_non_positive_stretch() {
        let mut rings = concentric([80.0, 68.0, 48.0, 44.0, 12.0, 5.0]);
        rings[2].stretch_y = 0.0;
        assert_eq!(
            BoardGeometry::new(rings, SectorConfig::default()),
            Err(GeometryError::NonPositiveAxis { index: 2 })
        );
    }

    #[test]
    fn nesting_violation_is_reported_not_rejected() {
        let rings = concentric([80.0, 68.0, 70.0, 44.0, 12.0, 5.0]);
        let g = BoardGeometry::new(rings, SectorConfig::default()).expect("soft check");
        assert_eq!(g.first_nesting_violation(), Some(1));

        let ok = BoardGeometry::new(
            concentric([80.0, 68.0, 48.0, 44.0, 12.0, 5.0]),
            SectorConfig::default(),
        )
        .expect("geometry");
        assert_eq!(ok.first_nesting_violation(), None);
    }

    #[test]
    fn default_geometry_is_centred_and_uncalibrated() {
        let g = BoardGeometry::default_for_frame(640, 480);
        assert!(!g.is_calibrated());
        assert_relative_eq!(g.rings()[0].scale, 192.0);
        assert_relative_eq!(g.rings()[5].scale, 192.0 * 0.06);
        assert_eq!(g.sector_origin(), Point2::new(320.0, 240.0));
        assert_eq!(g.first_nesting_violation(), None);
    }

    #[test]
    fn ellipse_radius_matches_axes() {
        let r = RingDescriptor {
            cx: 0.0,
            cy: 0.0,
            scale: 10.0,
            stretch_x: 2.0,
            stretch_y: 0.5,
        };
        assert_relative_eq!(r.radius_at(0.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(r.radius_at(std::f64::consts::FRAC_PI_2), 5.0, epsilon = 1e-9);
        assert!(r.contains(Point2::new(20.0, 0.0)));
        assert!(!r.contains(Point2::new(0.0, 5.1)));
    }
}
