//! Candidate marker outlines: convex quadrilaterals in a binary mask.

use dartcam_core::{
    approx_closed_polygon, find_external_contours, is_convex, polygon_perimeter,
    signed_polygon_area, GrayImage,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadParams {
    /// Contours shorter than this (in boundary pixels) are skipped.
    pub min_perimeter_px: f32,
    /// Contours longer than this fraction of the image perimeter are skipped.
    pub max_perimeter_rel: f32,
    /// Douglas-Peucker tolerance relative to the contour perimeter.
    pub approx_eps_rel: f32,
    /// Shortest accepted quad side.
    pub min_side_px: f32,
    /// Quads are kept away from the image border by this many pixels.
    pub border_margin_px: f32,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            min_perimeter_px: 40.0,
            max_perimeter_rel: 4.0,
            approx_eps_rel: 0.03,
            min_side_px: 8.0,
            border_margin_px: 2.0,
        }
    }
}

/// Convex four-cornered outlines of the foreground regions in `mask`,
/// corners ordered clockwise in image coordinates.
pub fn find_quads(mask: &GrayImage, params: &QuadParams) -> Vec<[Point2<f32>; 4]> {
    let image_perimeter = 2.0 * (mask.width + mask.height) as f32;
    let max_perimeter = params.max_perimeter_rel * image_perimeter;
    let (w, h) = (mask.width as f32, mask.height as f32);
    let margin = params.border_margin_px;

    let mut quads = Vec::new();
    for contour in find_external_contours(mask) {
        let len = contour.len() as f32;
        if len < params.min_perimeter_px || len > max_perimeter {
            continue;
        }
        let pts = contour.points_f32();
        let eps = params.approx_eps_rel * polygon_perimeter(&pts);
        let poly = approx_closed_polygon(&pts, eps);
        if poly.len() != 4 || !is_convex(&poly) {
            continue;
        }

        let mut quad = [poly[0], poly[1], poly[2], poly[3]];
        if signed_polygon_area(&quad) < 0.0 {
            quad.swap(1, 3);
        }

        let min_side = (0..4)
            .map(|i| (quad[(i + 1) % 4] - quad[i]).norm())
            .fold(f32::MAX, f32::min);
        if min_side < params.min_side_px {
            continue;
        }
        let near_border = quad.iter().any(|p| {
            p.x < margin || p.y < margin || p.x > w - 1.0 - margin || p.y > h - 1.0 - margin
        });
        if near_border {
            continue;
        }
        quads.push(quad);
    }
    quads
}
