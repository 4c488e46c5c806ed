//! Full-frame marker detection: threshold, find quads, decode.

use crate::decode::{DecodeParams, QuadDecoder};
use crate::quad::{find_quads, QuadParams};
use crate::threshold::adaptive_threshold_inv;
use crate::{builtins, Dictionary, DictionaryError, Matcher};
use dartcam_core::GrayImageView;
use log::{debug, trace};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Detector configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetectorParams {
    /// Adaptive threshold window side in pixels (odd).
    pub threshold_window: usize,
    /// Adaptive threshold offset: how much darker than the local mean a
    /// pixel has to be.
    pub threshold_offset: f32,
    /// Accepted Hamming distance; `None` uses the dictionary's capacity.
    pub max_hamming: Option<u8>,
    pub quad: QuadParams,
    pub decode: DecodeParams,
}

impl Default for MarkerDetectorParams {
    fn default() -> Self {
        Self {
            threshold_window: 23,
            threshold_offset: 7.0,
            max_hamming: None,
            quad: QuadParams::default(),
            decode: DecodeParams::default(),
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    pub id: u32,
    /// Image corners, clockwise from the marker's own top-left.
    pub corners: [Point2<f32>; 4],
    pub hamming: u8,
    pub score: f32,
}

impl DetectedMarker {
    pub fn center(&self) -> Point2<f32> {
        let c = self
            .corners
            .iter()
            .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(c / 4.0)
    }
}

/// Finds markers of one dictionary anywhere in a grayscale frame.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    params: MarkerDetectorParams,
    matcher: Matcher,
}

impl MarkerDetector {
    pub fn new(dict: Dictionary, params: MarkerDetectorParams) -> Result<Self, DictionaryError> {
        let max_hamming = params.max_hamming.unwrap_or(dict.max_correction_bits);
        let matcher = Matcher::new(dict, max_hamming)?;
        Ok(Self { params, matcher })
    }

    /// Detector for the board's four fiducials.
    pub fn board_markers(params: MarkerDetectorParams) -> Result<Self, DictionaryError> {
        Self::new(builtins::DARTCAM_4X4, params)
    }

    pub fn params(&self) -> &MarkerDetectorParams {
        &self.params
    }

    pub fn dictionary(&self) -> Dictionary {
        self.matcher.dictionary()
    }

    /// Detect markers; at most one (the best scoring) per id, sorted by id.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img), fields(width = img.width, height = img.height))
    )]
    pub fn detect(&self, img: &GrayImageView<'_>) -> Vec<DetectedMarker> {
        let mask = adaptive_threshold_inv(
            img,
            self.params.threshold_window,
            self.params.threshold_offset,
        );
        let quads = find_quads(&mask, &self.params.quad);

        let Some(mut decoder) = QuadDecoder::new(&self.params.decode, &self.matcher) else {
            debug!("decode parameters leave no room to sample bits");
            return Vec::new();
        };

        let mut best: HashMap<u32, DetectedMarker> = HashMap::new();
        for quad in &quads {
            let Some(dec) = decoder.decode(img, quad) else {
                continue;
            };
            trace!(
                "quad {:?}: id {} rot {} border {:.2}{}",
                quad[0],
                dec.matched.id,
                dec.matched.rotation,
                dec.border_score,
                if dec.inverted { " (inverted)" } else { "" }
            );
            let cand = DetectedMarker {
                id: dec.matched.id,
                corners: dec.corners,
                hamming: dec.matched.hamming,
                score: dec.score,
            };
            match best.get(&cand.id) {
                Some(prev) if prev.score >= cand.score => {}
                _ => {
                    best.insert(cand.id, cand);
                }
            }
        }

        let mut out: Vec<DetectedMarker> = best.into_values().collect();
        out.sort_by_key(|m| m.id);
        debug!(
            "{} quads, {} markers decoded: {:?}",
            quads.len(),
            out.len(),
            out.iter().map(|m| m.id).collect::<Vec<_>>()
        );
        out
    }
}
