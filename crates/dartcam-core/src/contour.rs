//! Outer borders of connected foreground regions in a binary mask.
//!
//! Border following is `imageproc`'s (Suzuki-Abe, 8-connected foreground).
//! Only top-level outer borders are kept, so components sitting inside a hole
//! of another component are not reported.

use crate::image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;

/// Ordered boundary pixels of one connected foreground region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area of the boundary polygon through the pixel centres.
    ///
    /// A filled `w × h` rectangle has area `(w - 1) * (h - 1)`; lines and
    /// single pixels have zero area.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0i64;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            acc += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
        }
        (acc as f64 * 0.5).abs()
    }

    pub fn points_f32(&self) -> Vec<Point2<f32>> {
        self.points
            .iter()
            .map(|p| Point2::new(p.x as f32, p.y as f32))
            .collect()
    }
}

/// Smallest Euclidean distance between any point of `a` and any point of `b`.
///
/// Returns `f32::INFINITY` when either side is empty.
pub fn min_point_distance(a: &[Point2<i32>], b: &[Point2<i32>]) -> f32 {
    let mut best = i64::MAX;
    for p in a {
        for q in b {
            let dx = (p.x - q.x) as i64;
            let dy = (p.y - q.y) as i64;
            best = best.min(dx * dx + dy * dy);
        }
    }
    if best == i64::MAX {
        f32::INFINITY
    } else {
        (best as f64).sqrt() as f32
    }
}

/// Outer contours of every 8-connected foreground region in `mask`
/// (any non-zero pixel is foreground), in raster order of their first pixel.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    if mask.data.is_empty() {
        return Vec::new();
    }
    find_contours::<i32>(&mask.to_luma())
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
            points: c.points.iter().map(|p| Point2::new(p.x, p.y)).collect(),
        })
        .collect()
}
