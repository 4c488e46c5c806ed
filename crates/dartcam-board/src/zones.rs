//! Point → (ring pair, sector) → scored zone.

use crate::geometry::{BoardGeometry, RING_COUNT};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECTOR_COUNT: usize = 20;
pub const SECTOR_SPAN_DEG: f64 = 360.0 / SECTOR_COUNT as f64;

/// Added to the measured angle so that sector 0 starts on the wire left of
/// the 20 for a board mounted with its fiducials as calibrated.
///
/// Calibration-dependent: a differently oriented board or marker layout
/// needs a different value (or a compensating `SectorConfig::rotation`).
pub const SECTOR_ANCHOR_DEG: f64 = 108.0;

/// Board numbers by sector index.
pub const DARTBOARD_NUMBERS: [u8; SECTOR_COUNT] =
    [20, 1, 18, 4, 13, 6, 10, 15, 2, 17, 3, 19, 7, 16, 8, 11, 14, 9, 12, 5];

/// Which ring ellipses a point sits between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingMembership {
    /// `Single(0)`: outside ring 0. `Single(5)`: inside the bullseye.
    Single(usize),
    /// Inside ring `.0`, outside ring `.1 = .0 + 1`.
    Pair(usize, usize),
}

/// Scored area of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "number", rename_all = "snake_case")]
pub enum Zone {
    Outside,
    Bullseye,
    OuterBull,
    Double(u8),
    Triple(u8),
    SingleOuter(u8),
    SingleInner(u8),
    /// Any other ring combination (non-nested calibration).
    Single(u8),
}

impl Zone {
    /// Long form, e.g. `"double 20"`, `"single 5 (outer)"`, `"0 (outside)"`.
    pub fn label(&self) -> String {
        match *self {
            Zone::Outside => "0 (outside)".to_string(),
            Zone::Bullseye => "bullseye".to_string(),
            Zone::OuterBull => "outer bull".to_string(),
            Zone::Double(n) => format!("double {n}"),
            Zone::Triple(n) => format!("triple {n}"),
            Zone::SingleOuter(n) => format!("single {n} (outer)"),
            Zone::SingleInner(n) => format!("single {n} (inner)"),
            Zone::Single(n) => format!("single {n}"),
        }
    }

    /// Scoreboard form: `D20`, `T19`, `S5`, `25`, `50`, `0`.
    pub fn code(&self) -> String {
        match *self {
            Zone::Outside => "0".to_string(),
            Zone::Bullseye => "50".to_string(),
            Zone::OuterBull => "25".to_string(),
            Zone::Double(n) => format!("D{n}"),
            Zone::Triple(n) => format!("T{n}"),
            Zone::SingleOuter(n) | Zone::SingleInner(n) => format!("S{n}"),
            Zone::Single(n) => n.to_string(),
        }
    }

    pub fn points(&self) -> u32 {
        match *self {
            Zone::Outside => 0,
            Zone::Bullseye => 50,
            Zone::OuterBull => 25,
            Zone::Double(n) => 2 * n as u32,
            Zone::Triple(n) => 3 * n as u32,
            Zone::SingleOuter(n) | Zone::SingleInner(n) | Zone::Single(n) => n as u32,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classifies points against one [`BoardGeometry`].
#[derive(Clone, Debug)]
pub struct ZoneClassifier {
    geometry: BoardGeometry,
}

impl ZoneClassifier {
    pub fn new(geometry: BoardGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    /// Outermost-first search for the ring pair enclosing `p`.
    pub fn classify_ring(&self, p: Point2<f32>) -> RingMembership {
        let p = p.cast::<f64>();
        let rings = self.geometry.rings();
        for i in 0..RING_COUNT - 1 {
            if rings[i].contains(p) && !rings[i + 1].contains(p) {
                return RingMembership::Pair(i, i + 1);
            }
        }
        if rings[RING_COUNT - 1].contains(p) {
            return RingMembership::Single(RING_COUNT - 1);
        }
        RingMembership::Single(0)
    }

    /// Sector index in `0..20` of the angle around the sector origin.
    pub fn classify_sector(&self, p: Point2<f32>) -> usize {
        let origin = self.geometry.sector_origin();
        let dx = p.x as f64 - origin.x;
        let dy = p.y as f64 - origin.y;
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        let adjusted =
            (angle - self.geometry.sectors().rotation + SECTOR_ANCHOR_DEG).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0
        ((adjusted / SECTOR_SPAN_DEG).floor() as usize).min(SECTOR_COUNT - 1)
    }

    pub fn classify_field(&self, ring: RingMembership, sector: usize) -> Zone {
        let number = DARTBOARD_NUMBERS[sector % SECTOR_COUNT];
        match ring {
            RingMembership::Single(0) => Zone::Outside,
            RingMembership::Single(i) if i == RING_COUNT - 1 => Zone::Bullseye,
            RingMembership::Pair(0, 1) => Zone::Double(number),
            RingMembership::Pair(1, 2) => Zone::SingleOuter(number),
            RingMembership::Pair(2, 3) => Zone::Triple(number),
            RingMembership::Pair(3, 4) => Zone::SingleInner(number),
            RingMembership::Pair(4, 5) => Zone::OuterBull,
            _ => Zone::Single(number),
        }
    }

    pub fn classify(&self, p: Point2<f32>) -> Zone {
        self.classify_field(self.classify_ring(p), self.classify_sector(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RingDescriptor, SectorConfig};

    fn board(scales: [f64; 6]) -> ZoneClassifier {
        let rings = scales
            .iter()
            .map(|&s| RingDescriptor::circle(250.0, 250.0, s))
            .collect();
        ZoneClassifier::new(BoardGeometry::new(rings, SectorConfig::default()).expect("geometry"))
    }

    fn standard() -> ZoneClassifier {
        board([80.0, 68.0, 48.0, 44.0, 12.0, 5.0])
    }

    fn polar(deg: f64, r: f64) -> Point2<f32> {
        let a = deg.to_radians();
        Point2::new((250.0 + r * a.cos()) as f32, (250.0 + r * a.sin()) as f32)
    }

    #[test]
    fn every_ring_band_maps_to_its_pair() {
        let c = standard();
        let scales = [80.0, 68.0, 48.0, 44.0, 12.0, 5.0];
        for i in 0..5 {
            let mid = 0.5 * (scales[i] + scales[i + 1]);
            for deg in [0.0, 33.0, 97.0, 180.0, 271.0] {
                assert_eq!(
                    c.classify_ring(polar(deg, mid)),
                    RingMembership::Pair(i, i + 1),
                    "band {i} at {deg} deg"
                );
            }
        }
    }

    #[test]
    fn centre_is_bullseye_and_far_away_is_outside() {
        let c = standard();
        let centre = Point2::new(250.0, 250.0);
        assert_eq!(c.classify_ring(centre), RingMembership::Single(5));
        assert_eq!(c.classify(centre), Zone::Bullseye);

        let far = Point2::new(900.0, -400.0);
        assert_eq!(c.classify_ring(far), RingMembership::Single(0));
        assert_eq!(c.classify(far).label(), "0 (outside)");
    }

    #[test]
    fn point_on_ring_zero_boundary_is_a_double() {
        let c = standard();
        let zone = c.classify(Point2::new(250.0, 170.0));
        assert!(zone.label().starts_with("double "), "{}", zone.label());
        // straight up sits on the 20/1 wire, the anchor puts it in sector 1
        assert_eq!(zone, Zone::Double(1));
    }

    #[test]
    fn sectors_advance_every_eighteen_degrees() {
        let c = standard();
        let base = c.classify_sector(polar(9.0, 30.0));
        for k in 0..40 {
            let deg = 9.0 + 18.0 * k as f64;
            assert_eq!(
                c.classify_sector(polar(deg, 30.0)),
                (base + k) % SECTOR_COUNT,
                "step {k}"
            );
        }
    }

    #[test]
    fn sector_rotation_shifts_the_layout() {
        let rings = [80.0, 68.0, 48.0, 44.0, 12.0, 5.0]
            .iter()
            .map(|&s| RingDescriptor::circle(250.0, 250.0, s))
            .collect();
        let sectors = SectorConfig {
            rotation: 18.0,
            ..SectorConfig::default()
        };
        let rotated = ZoneClassifier::new(BoardGeometry::new(rings, sectors).expect("geometry"));
        let plain = standard();
        let p = polar(100.0, 30.0);
        assert_eq!(
            (rotated.classify_sector(p) + 1) % SECTOR_COUNT,
            plain.classify_sector(p)
        );
    }

    #[test]
    fn field_labels_and_codes() {
        let c = standard();
        let cases = [
            (RingMembership::Pair(0, 1), "double 20", "D20", 40),
            (RingMembership::Pair(1, 2), "single 20 (outer)", "S20", 20),
            (RingMembership::Pair(2, 3), "triple 20", "T20", 60),
            (RingMembership::Pair(3, 4), "single 20 (inner)", "S20", 20),
            (RingMembership::Pair(4, 5), "outer bull", "25", 25),
            (RingMembership::Single(5), "bullseye", "50", 50),
            (RingMembership::Single(0), "0 (outside)", "0", 0),
            (RingMembership::Single(3), "single 20", "20", 20),
        ];
        for (ring, label, code, points) in cases {
            let z = c.classify_field(ring, 0);
            assert_eq!(z.label(), label);
            assert_eq!(z.code(), code);
            assert_eq!(z.points(), points);
        }
        assert_eq!(c.classify_field(RingMembership::Pair(2, 3), 11).label(), "triple 19");
    }

    #[test]
    fn zone_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Zone::Triple(19)).expect("json");
        assert_eq!(json, r#"{"kind":"triple","number":19}"#);
        let back: Zone = serde_json::from_str(r#"{"kind":"bullseye"}"#).expect("parse");
        assert_eq!(back, Zone::Bullseye);
    }
}
