//! Debug image of the last accepted strike.
//!
//! The motion mask is drawn in gray with the shape the tip was read from
//! (triangle or rectangle) in yellow and the tip in red. The file is
//! overwritten on every strike and removed when the run ends.

use dartcam_core::GrayImage;
use dartcam_detect::{TipConstruction, TipEstimate};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use log::{debug, warn};
use nalgebra::Point2;
use std::fs;
use std::path::{Path, PathBuf};

const SHAPE: Rgb<u8> = Rgb([255, 255, 0]);
const TIP: Rgb<u8> = Rgb([255, 0, 0]);
const SEPARATION: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Clone, Debug)]
pub struct DebugArtifact {
    path: PathBuf,
}

fn xy(p: Point2<f32>) -> (f32, f32) {
    (p.x, p.y)
}

fn draw_closed(canvas: &mut RgbImage, pts: &[Point2<f32>]) {
    for (i, &p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        draw_line_segment_mut(canvas, xy(p), xy(q), SHAPE);
    }
}

/// Mask with the tip construction drawn over it.
pub fn render_overlay(mask: &GrayImage, estimate: &TipEstimate, separation: f32) -> RgbImage {
    let mut canvas = RgbImage::from_fn(mask.width as u32, mask.height as u32, |x, y| {
        let v = mask.get(x as usize, y as usize) / 2;
        Rgb([v, v, v])
    });
    match &estimate.construction {
        TipConstruction::Triangle(t) => draw_closed(&mut canvas, t),
        TipConstruction::Rectangle(r) => draw_closed(&mut canvas, &r.corners),
    }
    let c = (estimate.tip.x.round() as i32, estimate.tip.y.round() as i32);
    draw_filled_circle_mut(&mut canvas, c, 6, TIP);
    draw_hollow_circle_mut(&mut canvas, c, separation.round() as i32, SEPARATION);
    canvas
}

impl DebugArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mask: &GrayImage, estimate: &TipEstimate, separation: f32) {
        match render_overlay(mask, estimate, separation).save(&self.path) {
            Ok(()) => debug!("wrote {}", self.path.display()),
            Err(e) => warn!("failed to write {}: {e}", self.path.display()),
        }
    }

    /// Delete the artifact if one was written.
    pub fn remove(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to remove {}: {e}", self.path.display());
        }
    }
}
