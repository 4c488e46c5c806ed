//! Strike point estimation from the border points of a dart blob.
//!
//! Two strategies are available behind [`TipEstimator`]:
//! - [`HullTriangle`] fits the largest triangle into the blob's compact hull
//!   and takes the vertex opposite its shortest side, which for a dart seen
//!   from the front is the point.
//! - [`OrientedRect`] fits a minimum-area rectangle and takes the blob point
//!   farthest from the rectangle's longest side.

use dartcam_core::{convex_hull, min_area_rect, triangle_area, RotatedRect};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Shape a tip was read from, kept for debug overlays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TipConstruction {
    Triangle([Point2<f32>; 3]),
    Rectangle(RotatedRect),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TipEstimate {
    pub tip: Point2<f32>,
    pub construction: TipConstruction,
}

/// Locates the strike point of a blob.
pub trait TipEstimator: Send {
    fn name(&self) -> &'static str;

    /// `None` when the points do not describe a usable shape.
    fn estimate(&self, points: &[Point2<i32>]) -> Option<TipEstimate>;
}

fn to_f32(points: &[Point2<i32>]) -> Vec<Point2<f32>> {
    points
        .iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect()
}

/// Largest inscribed hull triangle; tip opposite its shortest side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullTriangle {
    /// Hull vertices at least this far from the hull centroid are dropped
    /// before the triangle search.
    pub max_radius: f32,
}

impl Default for HullTriangle {
    fn default() -> Self {
        Self { max_radius: 60.0 }
    }
}

impl HullTriangle {
    fn largest_triangle(points: &[Point2<f32>]) -> Option<[Point2<f32>; 3]> {
        let n = points.len();
        let mut best_area = 0.0f32;
        let mut best = None;
        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    let area = triangle_area(points[i], points[j], points[k]);
                    if area > best_area {
                        best_area = area;
                        best = Some([points[i], points[j], points[k]]);
                    }
                }
            }
        }
        best
    }
}

impl TipEstimator for HullTriangle {
    fn name(&self) -> &'static str {
        "hull_triangle"
    }

    fn estimate(&self, points: &[Point2<i32>]) -> Option<TipEstimate> {
        let hull = to_f32(&convex_hull(points));
        if hull.len() < 3 {
            return None;
        }
        let centroid = Point2::from(
            hull.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / hull.len() as f32,
        );
        let near: Vec<Point2<f32>> = hull
            .into_iter()
            .filter(|p| (p - centroid).norm() < self.max_radius)
            .collect();
        if near.len() < 3 {
            return None;
        }

        let [a, b, c] = Self::largest_triangle(&near)?;
        // (side length, opposite vertex); the first of equal sides wins
        let sides = [((a - b).norm(), c), ((a - c).norm(), b), ((b - c).norm(), a)];
        let tip = sides
            .iter()
            .fold(sides[0], |best, &s| if s.0 < best.0 { s } else { best })
            .1;
        Some(TipEstimate {
            tip,
            construction: TipConstruction::Triangle([a, b, c]),
        })
    }
}

/// Minimum-area rectangle; tip is the point farthest across from its
/// longest side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect;

impl TipEstimator for OrientedRect {
    fn name(&self) -> &'static str {
        "oriented_rect"
    }

    fn estimate(&self, points: &[Point2<i32>]) -> Option<TipEstimate> {
        let rect = min_area_rect(points)?;
        let pts = to_f32(points);
        let (p1, p2) = rect.edge(rect.longest_edge());
        let e = (p2 - p1).try_normalize(f32::EPSILON)?;
        // normal pointing into the rectangle
        let mut normal = Vector2::new(-e.y, e.x);
        if (rect.center() - p1).dot(&normal) < 0.0 {
            normal = -normal;
        }

        let mut best: Option<(f32, Point2<f32>)> = None;
        for &p in &pts {
            let proj = (p - p1).dot(&normal);
            if best.map_or(true, |(b, _)| proj > b) {
                best = Some((proj, p));
            }
        }
        let (_, tip) = best?;
        Some(TipEstimate {
            tip,
            construction: TipConstruction::Rectangle(rect),
        })
    }
}

/// Serializable choice of tip estimator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TipStrategy {
    HullTriangle(HullTriangle),
    OrientedRect,
}

impl Default for TipStrategy {
    fn default() -> Self {
        Self::HullTriangle(HullTriangle::default())
    }
}

impl TipStrategy {
    pub fn build(&self) -> Box<dyn TipEstimator + Send> {
        match *self {
            Self::HullTriangle(h) => Box::new(h),
            Self::OrientedRect => Box::new(OrientedRect),
        }
    }
}
