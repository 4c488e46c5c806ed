//! Dart board geometry and scoring.
//!
//! A board is six nested ring ellipses ([`RingDescriptor`], outermost first)
//! and a 20-wedge angular layout ([`SectorConfig`]). [`ZoneClassifier`] maps
//! a board-plane point to the ring pair it sits between, the sector it falls
//! in, and from those to a [`Zone`] with a label, a short code and points.
//!
//! Geometry is produced by a separate calibration step and loaded from JSON
//! with [`BoardGeometry::load_json`] or [`BoardGeometry::load_or_default`].

mod geometry;
pub mod io;
mod zones;

pub use geometry::{
    BoardGeometry, GeometryError, RingDescriptor, SectorConfig, DEFAULT_RING_RATIOS, RING_COUNT,
};
pub use io::GeometryIoError;
pub use zones::{
    RingMembership, Zone, ZoneClassifier, DARTBOARD_NUMBERS, SECTOR_ANCHOR_DEG, SECTOR_COUNT,
    SECTOR_SPAN_DEG,
};
