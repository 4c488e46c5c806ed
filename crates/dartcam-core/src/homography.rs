//! Planar projective transforms between board and camera coordinates.

use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector2, Vector3};

/// A 3×3 projective transform acting on homogeneous 2D points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Map a point. Points on the line at infinity come back non-finite.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Similarity that moves the centroid of `pts` to the origin and scales
/// their mean distance to it to √2, plus the moved points.
fn conditioning(pts: &[Point2<f32>; 4]) -> (Matrix3<f64>, [Point2<f64>; 4]) {
    let pts = pts.map(|p| Point2::new(p.x as f64, p.y as f64));
    let centroid = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / 4.0;
    let spread = pts.iter().map(|p| (p.coords - centroid).norm()).sum::<f64>() / 4.0;
    let s = if spread > 1e-12 {
        std::f64::consts::SQRT_2 / spread
    } else {
        1.0
    };
    let t = Matrix3::new(
        s, 0.0, -s * centroid.x, //
        0.0, s, -s * centroid.y, //
        0.0, 0.0, 1.0,
    );
    (t, pts.map(|p| Point2::from((p.coords - centroid) * s)))
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (three collinear points, repeated points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let (t_src, src) = conditioning(src);
    let (t_dst, dst) = conditioning(dst);

    // h33 fixed to 1; each correspondence gives one row for u and one for v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for (k, (p, q)) in src.iter().zip(dst.iter()).enumerate() {
        let rows = [
            [p.x, p.y, 1.0, 0.0, 0.0, 0.0, -q.x * p.x, -q.x * p.y],
            [0.0, 0.0, 0.0, p.x, p.y, 1.0, -q.y * p.x, -q.y * p.y],
        ];
        for (r, (row, rhs)) in rows.iter().zip([q.x, q.y]).enumerate() {
            a.row_mut(2 * k + r).copy_from_slice(row);
            b[2 * k + r] = rhs;
        }
    }

    let x = a.lu().solve(&b)?;
    if !x.iter().all(|v| v.is_finite()) {
        return None;
    }
    let conditioned = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    let h = t_dst.try_inverse()? * conditioned * t_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    let h = h / scale;
    (h.determinant().abs() >= 1e-12).then(|| Homography::new(h))
}
