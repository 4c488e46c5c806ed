//! Reading marker bits from an image quad.

use crate::threshold::otsu_threshold;
use crate::{Match, Matcher};
use dartcam_core::{homography_from_4pt, GrayImageView, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Bit sampling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Black border width in cells.
    pub border_bits: usize,
    /// Fraction of the marker side ignored along each edge before sampling.
    pub inset_frac: f32,
    /// Minimum fraction of border cells that must read black.
    pub min_border_score: f32,
    /// Side of the canonical square the quad is mapped from, in pixels.
    pub canonical_px: f32,
    /// Also try white-on-black markers.
    pub allow_inverted: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            inset_frac: 0.0,
            min_border_score: 0.85,
            canonical_px: 48.0,
            allow_inverted: false,
        }
    }
}

/// A quad whose bits matched a dictionary entry.
#[derive(Clone, Debug)]
pub(crate) struct DecodedQuad {
    pub matched: Match,
    pub border_score: f32,
    /// `border_score` penalised by the Hamming distance.
    pub score: f32,
    pub inverted: bool,
    /// Quad corners re-indexed so `corners[0]` is the marker's own top-left
    /// and the order runs clockwise.
    pub corners: [Point2<f32>; 4],
}

#[derive(Clone, Copy, Debug)]
struct BitObservation {
    code: u64,
    border_score: f32,
    inverted: bool,
}

const MIN_SIDE_PX: f32 = 12.0;
const THRESH_SUBDIV: usize = 3;

/// Cell-centre sample positions in canonical square coordinates.
struct SampleGrid {
    cells: usize,
    points: Vec<Point2<f32>>, // row-major: cy * cells + cx
    threshold_points: Vec<Point2<f32>>,
}

impl SampleGrid {
    fn new(params: &DecodeParams, bits: usize) -> Option<Self> {
        let cells = bits + 2 * params.border_bits;
        if bits * bits > 64 || cells == 0 {
            return None;
        }

        let s = params.canonical_px;
        let inset = (params.inset_frac * s).max(0.0);
        let side = s - 2.0 * inset;
        if side < MIN_SIDE_PX {
            return None;
        }

        let grid_points = |n: usize| {
            let step = side / n as f32;
            (0..n * n)
                .map(|i| {
                    let (cx, cy) = (i % n, i / n);
                    Point2::new(
                        inset + (cx as f32 + 0.5) * step,
                        inset + (cy as f32 + 0.5) * step,
                    )
                })
                .collect::<Vec<_>>()
        };

        Some(Self {
            cells,
            points: grid_points(cells),
            threshold_points: grid_points(cells * THRESH_SUBDIV),
        })
    }

    fn square(&self, s: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(s, 0.0),
            Point2::new(s, s),
            Point2::new(0.0, s),
        ]
    }
}

/// Reusable quad decoder for one dictionary and parameter set.
pub(crate) struct QuadDecoder<'a> {
    params: &'a DecodeParams,
    matcher: &'a Matcher,
    grid: SampleGrid,
    scratch_bits: Vec<u8>,
    scratch_thr: Vec<u8>,
}

impl<'a> QuadDecoder<'a> {
    pub(crate) fn new(params: &'a DecodeParams, matcher: &'a Matcher) -> Option<Self> {
        let grid = SampleGrid::new(params, matcher.dictionary().marker_size)?;
        Some(Self {
            params,
            matcher,
            scratch_bits: Vec::with_capacity(grid.points.len()),
            scratch_thr: Vec::with_capacity(grid.threshold_points.len()),
            grid,
        })
    }

    /// Decode the marker inside `quad` (clockwise in the image).
    pub(crate) fn decode(
        &mut self,
        img: &GrayImageView<'_>,
        quad: &[Point2<f32>; 4],
    ) -> Option<DecodedQuad> {
        let square = self.grid.square(self.params.canonical_px);
        let h = homography_from_4pt(&square, quad)?;
        let obs = self.read_bits(img, &h)?;
        let m = self.matcher.match_code(obs.code)?;

        let bits = self.matcher.dictionary().bit_count().max(1) as f32;
        let score = (obs.border_score * (1.0 - m.hamming as f32 / bits)).clamp(0.0, 1.0);
        let r = m.rotation as usize;
        let corners = [0usize, 1, 2, 3].map(|k| quad[(k + r) % 4]);

        Some(DecodedQuad {
            matched: m,
            border_score: obs.border_score,
            score,
            inverted: obs.inverted,
            corners,
        })
    }

    fn read_bits(&mut self, img: &GrayImageView<'_>, h: &Homography) -> Option<BitObservation> {
        self.scratch_bits.clear();
        for p in &self.grid.points {
            let q = h.apply(*p);
            self.scratch_bits.push(sample_mean_3x3(img, q.x, q.y)?);
        }

        self.scratch_thr.clear();
        for p in &self.grid.threshold_points {
            let q = h.apply(*p);
            if let Some(v) = sample_mean_3x3(img, q.x, q.y) {
                self.scratch_thr.push(v);
            }
        }

        let bits = self.matcher.dictionary().marker_size;
        classify_cells(
            &self.scratch_bits,
            &self.scratch_thr,
            self.grid.cells,
            bits,
            self.params,
        )
    }
}

fn classify_cells(
    samples: &[u8],
    thr_samples: &[u8],
    cells: usize,
    bits: usize,
    params: &DecodeParams,
) -> Option<BitObservation> {
    if samples.len() != cells * cells {
        return None;
    }
    let border = params.border_bits;
    let thr = if thr_samples.is_empty() {
        otsu_threshold(samples)
    } else {
        otsu_threshold(thr_samples)
    };

    let polarities: &[bool] = if params.allow_inverted {
        &[false, true]
    } else {
        &[false]
    };

    let mut best: Option<BitObservation> = None;
    for &inverted in polarities {
        let mut border_black = 0u32;
        let mut border_total = 0u32;
        let mut code = 0u64;

        for cy in 0..cells {
            for cx in 0..cells {
                let is_black = (samples[cy * cells + cx] < thr) != inverted;
                let on_border = cx < border
                    || cy < border
                    || cx + border >= cells
                    || cy + border >= cells;
                if on_border {
                    border_total += 1;
                    border_black += is_black as u32;
                } else if is_black {
                    code |= 1u64 << ((cy - border) * bits + (cx - border));
                }
            }
        }

        let border_score = if border_total > 0 {
            border_black as f32 / border_total as f32
        } else {
            1.0
        };
        if border_score < params.min_border_score {
            continue;
        }
        if best.map_or(true, |b| border_score > b.border_score) {
            best = Some(BitObservation {
                code,
                border_score,
                inverted,
            });
        }
    }

    best
}

fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    if ix < 1 || iy < 1 || ix + 1 >= img.width as i32 || iy + 1 >= img.height as i32 {
        return None;
    }

    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += img.get_or_zero(ix + dx, iy + dy) as u32;
        }
    }
    Some((sum / 9) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DARTCAM_4X4;
    use crate::rotate_code_u64;
    use dartcam_core::GrayImage;

    /// Marker with `cell_px` cells on a white canvas with a `margin` border.
    fn render_marker(code: u64, cell_px: usize, margin: usize) -> GrayImage {
        let cells = 6;
        let side = cells * cell_px + 2 * margin;
        let mut img = GrayImage::filled(side, side, 255);
        for cy in 0..cells {
            for cx in 0..cells {
                let border = cx == 0 || cy == 0 || cx == 5 || cy == 5;
                let black = border || (code >> ((cy - 1) * 4 + (cx - 1))) & 1 == 1;
                if !black {
                    continue;
                }
                for yy in 0..cell_px {
                    for xx in 0..cell_px {
                        img.set(margin + cx * cell_px + xx, margin + cy * cell_px + yy, 0);
                    }
                }
            }
        }
        img
    }

    fn quad(x0: f32, y0: f32, s: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(x0, y0),
            Point2::new(x0 + s, y0),
            Point2::new(x0 + s, y0 + s),
            Point2::new(x0, y0 + s),
        ]
    }

    #[test]
    fn decodes_an_axis_aligned_marker() {
        let params = DecodeParams::default();
        let matcher = Matcher::new(DARTCAM_4X4, 0).expect("matcher");
        let img = render_marker(DARTCAM_4X4.codes[3], 10, 10);
        let q = quad(10.0, 10.0, 60.0);

        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        let det = decoder.decode(&img.view(), &q).expect("decoded");
        assert_eq!(det.matched.id, 3);
        assert_eq!(det.matched.rotation, 0);
        assert_eq!(det.corners, q);
        assert!(det.border_score > 0.99);
    }

    #[test]
    fn rotated_marker_reorders_corners() {
        let params = DecodeParams::default();
        let matcher = Matcher::new(DARTCAM_4X4, 0).expect("matcher");
        let rotated = rotate_code_u64(DARTCAM_4X4.codes[1], 4, 1);
        let img = render_marker(rotated, 10, 10);
        let q = quad(10.0, 10.0, 60.0);

        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        let det = decoder.decode(&img.view(), &q).expect("decoded");
        assert_eq!(det.matched.id, 1);
        assert_eq!(det.matched.rotation, 1);
        assert_eq!(det.corners[0], q[1]);
        assert_eq!(det.corners[3], q[0]);
    }

    #[test]
    fn blank_quad_is_rejected() {
        let params = DecodeParams::default();
        let matcher = Matcher::new(DARTCAM_4X4, 1).expect("matcher");
        let img = GrayImage::filled(80, 80, 255);
        let mut decoder = QuadDecoder::new(&params, &matcher).expect("decoder");
        assert!(decoder.decode(&img.view(), &quad(10.0, 10.0, 60.0)).is_none());
    }
}
