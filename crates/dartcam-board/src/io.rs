//! Geometry snapshots on disk.
//!
//! Two files, as the calibration tool writes them:
//! - rings: a JSON array of six `{cx, cy, scale, stretch_x, stretch_y}`,
//! - sectors: one `{rotation, offset_x, offset_y, scale, stretch_x, stretch_y}`
//!   object (missing keys take their defaults).

use crate::geometry::{BoardGeometry, GeometryError, RingDescriptor, SectorConfig};
use log::{info, warn};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum GeometryIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{path} is empty")]
    Empty { path: String },
    #[error(transparent)]
    Invalid(#[from] GeometryError),
}

fn read_non_empty(path: &Path) -> Result<String, GeometryIoError> {
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Err(GeometryIoError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(raw)
}

pub fn load_rings(path: impl AsRef<Path>) -> Result<Vec<RingDescriptor>, GeometryIoError> {
    let raw = read_non_empty(path.as_ref())?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn load_sectors(path: impl AsRef<Path>) -> Result<SectorConfig, GeometryIoError> {
    let raw = read_non_empty(path.as_ref())?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_rings(path: impl AsRef<Path>, rings: &[RingDescriptor]) -> Result<(), GeometryIoError> {
    fs::write(path, serde_json::to_string_pretty(rings)?)?;
    Ok(())
}

pub fn write_sectors(path: impl AsRef<Path>, sectors: &SectorConfig) -> Result<(), GeometryIoError> {
    fs::write(path, serde_json::to_string_pretty(sectors)?)?;
    Ok(())
}

impl BoardGeometry {
    /// Load and validate both files.
    pub fn load_json(
        rings: impl AsRef<Path>,
        sectors: impl AsRef<Path>,
    ) -> Result<Self, GeometryIoError> {
        let rings = load_rings(rings)?;
        let sectors = load_sectors(sectors)?;
        Ok(Self::new(rings, sectors)?)
    }

    /// Write both files.
    pub fn write_json(
        &self,
        rings: impl AsRef<Path>,
        sectors: impl AsRef<Path>,
    ) -> Result<(), GeometryIoError> {
        write_rings(rings, self.rings())?;
        write_sectors(sectors, self.sectors())
    }

    /// Load both files, falling back per file on failure.
    ///
    /// Unusable rings give [`BoardGeometry::default_for_frame`]; an unusable
    /// sector file gives [`SectorConfig::default`]. Either fallback marks the
    /// result uncalibrated.
    pub fn load_or_default(
        rings: impl AsRef<Path>,
        sectors: impl AsRef<Path>,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let (rings, sectors) = (rings.as_ref(), sectors.as_ref());
        let fallback = Self::default_for_frame(frame_width, frame_height);

        let sector_cfg = match load_sectors(sectors) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("sector config {}: {}; using defaults", sectors.display(), e);
                None
            }
        };

        let ring_list = match load_rings(rings) {
            Ok(r) => r,
            Err(e) => {
                warn!("rings {}: {}; using uncalibrated layout", rings.display(), e);
                return match sector_cfg {
                    Some(s) => Self::new(fallback.rings().to_vec(), s)
                        .map(Self::mark_uncalibrated)
                        .unwrap_or(fallback),
                    None => fallback,
                };
            }
        };

        let loaded = Self::new(ring_list, sector_cfg.unwrap_or_default());
        match (loaded, sector_cfg.is_some()) {
            (Ok(g), true) => {
                info!("loaded board geometry from {}", rings.display());
                g
            }
            (Ok(g), false) => g.mark_uncalibrated(),
            (Err(e), _) => {
                warn!("rings {}: {}; using uncalibrated layout", rings.display(), e);
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZoneClassifier;
    use nalgebra::Point2;

    fn sample_geometry() -> BoardGeometry {
        let rings = [80.0, 68.0, 48.0, 44.0, 12.0, 5.0]
            .iter()
            .map(|&s| RingDescriptor {
                cx: 251.5,
                cy: 248.0,
                scale: s,
                stretch_x: 1.1,
                stretch_y: 0.93,
            })
            .collect();
        let sectors = SectorConfig {
            rotation: 7.5,
            offset_x: 1.0,
            offset_y: -2.0,
            ..SectorConfig::default()
        };
        BoardGeometry::new(rings, sectors).expect("geometry")
    }

    #[test]
    fn reloaded_geometry_gives_identical_labels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (rp, sp) = (dir.path().join("rings.json"), dir.path().join("sectors.json"));
        let original = sample_geometry();
        original.write_json(&rp, &sp).expect("write");

        let reloaded = BoardGeometry::load_json(&rp, &sp).expect("load");
        assert_eq!(reloaded, original);

        let (a, b) = (ZoneClassifier::new(original), ZoneClassifier::new(reloaded));
        for y in (150..350).step_by(7) {
            for x in (150..350).step_by(11) {
                let p = Point2::new(x as f32, y as f32);
                assert_eq!(a.classify(p).label(), b.classify(p).label());
            }
        }
    }

    #[test]
    fn sector_file_accepts_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sp = dir.path().join("sectors.json");
        fs::write(&sp, r#"{"rotation": 12.0}"#).expect("write");
        let s = load_sectors(&sp).expect("load");
        assert_eq!(s.rotation, 12.0);
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.offset_x, 0.0);
    }

    #[test]
    fn missing_files_fall_back_to_uncalibrated_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let g = BoardGeometry::load_or_default(
            dir.path().join("nope.json"),
            dir.path().join("nada.json"),
            500,
            500,
        );
        assert!(!g.is_calibrated());
        assert_eq!(g, BoardGeometry::default_for_frame(500, 500));
    }

    #[test]
    fn malformed_rings_fall_back_but_keep_sectors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (rp, sp) = (dir.path().join("rings.json"), dir.path().join("sectors.json"));
        fs::write(&rp, "[{\"cx\": 1.0}]").expect("write");
        fs::write(&sp, r#"{"rotation": 30.0}"#).expect("write");
        let g = BoardGeometry::load_or_default(&rp, &sp, 400, 300);
        assert!(!g.is_calibrated());
        assert_eq!(g.sectors().rotation, 30.0);
        assert_eq!(g.rings()[0].cx, 200.0);
    }

    #[test]
    fn wrong_ring_count_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (rp, sp) = (dir.path().join("rings.json"), dir.path().join("sectors.json"));
        write_rings(&rp, &sample_geometry().rings()[..4]).expect("write");
        write_sectors(&sp, &SectorConfig::default()).expect("write");
        let err = BoardGeometry::load_json(&rp, &sp).unwrap_err();
        assert!(matches!(err, GeometryIoError::Invalid(GeometryError::RingCount(4))));
    }
}
