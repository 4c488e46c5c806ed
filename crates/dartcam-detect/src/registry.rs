//! Accepted strikes and spatial deduplication.

use crate::params::RegistryParams;
use log::debug;
use nalgebra::Point2;
use serde::Serialize;
use std::time::Instant;

/// One accepted strike, in camera coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StrikeRecord {
    pub position: Point2<f32>,
    #[serde(skip)]
    pub detected_at: Instant,
}

/// Strikes accepted since the last reset.
///
/// A candidate is new when it lies at least `min_separation` pixels away
/// from every record, not just the latest one.
#[derive(Clone, Debug, Default)]
pub struct StrikeRegistry {
    params: RegistryParams,
    records: Vec<StrikeRecord>,
}

impl StrikeRegistry {
    pub fn new(params: RegistryParams) -> Self {
        Self {
            params,
            records: Vec::new(),
        }
    }

    pub fn params(&self) -> &RegistryParams {
        &self.params
    }

    pub fn set_min_separation(&mut self, px: f32) {
        self.params.min_separation = px;
    }

    pub fn is_new(&self, point: Point2<f32>) -> bool {
        self.records
            .iter()
            .all(|r| (r.position - point).norm() >= self.params.min_separation)
    }

    /// Record `point` if it is new. Returns whether it was accepted.
    pub fn try_register(&mut self, point: Point2<f32>, now: Instant) -> bool {
        if !self.is_new(point) {
            debug!(
                "strike at ({:.1}, {:.1}) within {} px of a known one",
                point.x, point.y, self.params.min_separation
            );
            return false;
        }
        self.records.push(StrikeRecord {
            position: point,
            detected_at: now,
        });
        true
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[StrikeRecord] {
        &self.records
    }

    pub fn positions(&self) -> impl Iterator<Item = Point2<f32>> + '_ {
        self.records.iter().map(|r| r.position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
