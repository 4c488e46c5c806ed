use dartcam_board::{
    BoardGeometry, RingDescriptor, RingMembership, SectorConfig, Zone, ZoneClassifier,
    DARTBOARD_NUMBERS,
};
use nalgebra::Point2;

const SCALES: [f64; 6] = [80.0, 68.0, 48.0, 44.0, 12.0, 5.0];

/// Slightly elliptical board, as seen by a camera above the board's centre.
fn elliptical_board() -> ZoneClassifier {
    let rings = SCALES
        .iter()
        .map(|&s| RingDescriptor {
            cx: 320.0,
            cy: 240.0,
            scale: s,
            stretch_x: 1.3,
            stretch_y: 0.9,
        })
        .collect();
    ZoneClassifier::new(BoardGeometry::new(rings, SectorConfig::default()).expect("geometry"))
}

#[test]
fn bands_follow_the_ellipse_axes() {
    let c = elliptical_board();
    for i in 0..5 {
        let mid = 0.5 * (SCALES[i] + SCALES[i + 1]);
        let on_x = Point2::new((320.0 + 1.3 * mid) as f32, 240.0);
        let on_y = Point2::new(320.0, (240.0 - 0.9 * mid) as f32);
        assert_eq!(c.classify_ring(on_x), RingMembership::Pair(i, i + 1));
        assert_eq!(c.classify_ring(on_y), RingMembership::Pair(i, i + 1));
    }
    // same distance from the centre: a double along x, off the board along y
    let d = 100.0f32;
    assert_eq!(
        c.classify_ring(Point2::new(320.0 + d, 240.0)),
        RingMembership::Pair(0, 1)
    );
    assert_eq!(
        c.classify_ring(Point2::new(320.0, 240.0 - d)),
        RingMembership::Single(0)
    );
}

#[test]
fn each_sector_number_appears_once_around_the_triple_ring() {
    let c = elliptical_board();
    let rings = c.geometry().rings();
    let mut seen = Vec::new();
    for k in 0..20 {
        let a = (9.0 + 18.0 * k as f64).to_radians();
        let r = 0.5 * (rings[2].radius_at(a) + rings[3].radius_at(a));
        let p = Point2::new((320.0 + r * a.cos()) as f32, (240.0 + r * a.sin()) as f32);
        match c.classify(p) {
            Zone::Triple(n) => seen.push(n),
            other => panic!("expected a triple, got {other}"),
        }
    }
    seen.sort_unstable();
    let mut all = DARTBOARD_NUMBERS.to_vec();
    all.sort_unstable();
    assert_eq!(seen, all);
}
