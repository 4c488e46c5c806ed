//! Planar point-set geometry: convex hull, minimum-area rectangle and
//! polygon simplification.
//!
//! Hull and rectangle work on pixel coordinates and delegate to
//! `imageproc::geometry`.

use imageproc::point::Point;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

#[inline]
fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Signed shoelace area. Positive for clockwise order in a y-down image.
pub fn signed_polygon_area(points: &[Point2<f32>]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        acc += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (acc * 0.5) as f32
}

pub fn polygon_area(points: &[Point2<f32>]) -> f32 {
    signed_polygon_area(points).abs()
}

pub fn triangle_area(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> f32 {
    0.5 * cross(a, b, c).abs()
}

pub fn polygon_perimeter(points: &[Point2<f32>]) -> f32 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm())
        .sum()
}

#[inline]
fn to_ip(p: &Point2<i32>) -> Point<i32> {
    Point::new(p.x, p.y)
}

/// Convex hull of pixel coordinates.
///
/// Duplicates collapse; fewer than three distinct points come back as they
/// are (deduplicated).
pub fn convex_hull(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let mut pts: Vec<Point<i32>> = points.iter().map(to_ip).collect();
    pts.sort_by_key(|p| (p.x, p.y));
    pts.dedup();
    if pts.len() < 3 {
        return pts.into_iter().map(|p| Point2::new(p.x, p.y)).collect();
    }
    imageproc::geometry::convex_hull(pts.as_slice())
        .into_iter()
        .map(|p| Point2::new(p.x, p.y))
        .collect()
}

/// Oriented rectangle with corners in traversal order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub corners: [Point2<f32>; 4],
}

impl RotatedRect {
    /// Corners in clockwise order (y-down), starting from the top-most,
    /// then left-most one.
    pub fn from_corners(corners: [Point2<f32>; 4]) -> Self {
        let mut corners = corners;
        if signed_polygon_area(&corners) < 0.0 {
            corners.reverse();
        }
        let start = (0..4)
            .min_by(|&i, &j| {
                let (a, b) = (corners[i], corners[j]);
                a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
            })
            .unwrap_or(0);
        corners.rotate_left(start);
        Self { corners }
    }

    pub fn area(&self) -> f32 {
        polygon_area(&self.corners)
    }

    pub fn center(&self) -> Point2<f32> {
        let sum = self
            .corners
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / 4.0)
    }

    /// Edge `i` runs from `corners[i]` to `corners[(i + 1) % 4]`.
    pub fn edge(&self, i: usize) -> (Point2<f32>, Point2<f32>) {
        (self.corners[i % 4], self.corners[(i + 1) % 4])
    }

    /// Index of the longest edge (first one on ties).
    pub fn longest_edge(&self) -> usize {
        (0..4)
            .map(|i| {
                let (a, b) = self.edge(i);
                (i, (b - a).norm_squared())
            })
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best })
            .0
    }

    pub fn side_lengths(&self) -> (f32, f32) {
        let (a, b) = self.edge(0);
        let (c, d) = self.edge(1);
        ((b - a).norm(), (d - c).norm())
    }
}

/// Minimum-area enclosing rectangle of pixel coordinates.
///
/// Returns `None` for fewer than three hull points or a zero-width result.
pub fn min_area_rect(points: &[Point2<i32>]) -> Option<RotatedRect> {
    let hull: Vec<Point<i32>> = convex_hull(points).iter().map(to_ip).collect();
    if hull.len() < 3 {
        return None;
    }
    let corners =
        imageproc::geometry::min_area_rect(&hull).map(|p| Point2::new(p.x as f32, p.y as f32));
    let rect = RotatedRect::from_corners(corners);
    let (w, h) = rect.side_lengths();
    if rect.area() <= f32::EPSILON || w <= f32::EPSILON || h <= f32::EPSILON {
        return None;
    }
    Some(rect)
}

fn point_segment_distance(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f32 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= f32::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn douglas_peucker(points: &[Point2<f32>], epsilon: f32, keep: &mut [bool]) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let (a, b) = (points[0], points[n - 1]);
    let (idx, dist) = points[1..n - 1]
        .iter()
        .enumerate()
        .map(|(i, &p)| (i + 1, point_segment_distance(p, a, b)))
        .fold((0, -1.0f32), |best, cur| if cur.1 > best.1 { cur } else { best });
    if dist > epsilon {
        keep[idx] = true;
        douglas_peucker(&points[..=idx], epsilon, &mut keep[..=idx]);
        douglas_peucker(&points[idx..], epsilon, &mut keep[idx..]);
    }
}

/// Simplify a closed polygon with Douglas-Peucker.
///
/// The ring is split at the point farthest from the first vertex and again at
/// the point farthest from that one; both halves are simplified separately.
pub fn approx_closed_polygon(points: &[Point2<f32>], epsilon: f32) -> Vec<Point2<f32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let farthest_from = |from: usize| {
        (0..n)
            .map(|i| (i, (points[i] - points[from]).norm_squared()))
            .fold((from, -1.0f32), |best, cur| if cur.1 > best.1 { cur } else { best })
            .0
    };
    let i1 = farthest_from(0);
    let i2 = farthest_from(i1);
    if i1 == i2 {
        return vec![points[i1]];
    }

    // rotate so the ring starts at i1, then split at i2
    let ring: Vec<Point2<f32>> = (0..n).map(|k| points[(i1 + k) % n]).collect();
    let split = (i2 + n - i1) % n;
    let mut keep = vec![false; n + 1];
    keep[0] = true;
    keep[split] = true;

    let mut closed = ring.clone();
    closed.push(ring[0]);
    douglas_peucker(&closed[..=split], epsilon, &mut keep[..=split]);
    douglas_peucker(&closed[split..], epsilon, &mut keep[split..]);

    (0..n).filter(|&k| keep[k]).map(|k| ring[k]).collect()
}

/// True if the polygon turns the same way at every vertex.
pub fn is_convex(points: &[Point2<f32>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let c = cross(points[i], points[(i + 1) % n], points[(i + 2) % n]);
        if c.abs() <= f32::EPSILON {
            return false;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}
