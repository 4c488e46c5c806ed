//! Frame sources.
//!
//! [`ImageDirSource`] replays a directory of still images, which is how the
//! pipeline is exercised without a camera. [`CameraSource`] (feature
//! `camera`) reads a local webcam through `nokhwa`.

use crate::pipeline::CaptureError;
use dartcam_core::{GrayImage, ImageBufferError};
use image::RgbImage;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "pgm"];

pub trait FrameSource {
    /// Next frame, `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError>;

    /// Capture size, when known.
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Timestamp of the frame last returned by [`next_frame`](Self::next_frame).
    fn frame_time(&self) -> Instant {
        Instant::now()
    }
}

/// Luma of an RGB frame (BT.601 weights).
pub fn gray_from_rgb(img: &RgbImage) -> Result<GrayImage, ImageBufferError> {
    GrayImage::from_rgb(img.width() as usize, img.height() as usize, img.as_raw())
}

/// Sorted image files of a directory, one frame each.
#[derive(Debug)]
pub struct ImageDirSource {
    paths: Vec<PathBuf>,
    next: usize,
    resolution: Option<(u32, u32)>,
    interval: Option<Duration>,
    started: Instant,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        if paths.is_empty() {
            return Err(CaptureError::Empty(dir.to_path_buf()));
        }
        paths.sort();
        info!("replaying {} frames from {}", paths.len(), dir.display());
        let resolution = image::image_dimensions(&paths[0]).ok();
        Ok(Self {
            paths,
            next: 0,
            resolution,
            interval: None,
            started: Instant::now(),
        })
    }

    /// Stamp frame `k` at `start + k * interval` instead of the wall clock,
    /// so recorded sequences replay at their capture rate however fast they
    /// are read.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        debug!("frame {}", path.display());
        let img = image::open(path)
            .map_err(|source| CaptureError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        self.resolution = Some(img.dimensions());
        Ok(Some(img))
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    fn frame_time(&self) -> Instant {
        match self.interval {
            Some(dt) => self.started + dt * self.next.saturating_sub(1) as u32,
            None => Instant::now(),
        }
    }
}

#[cfg(feature = "camera")]
pub use camera::CameraSource;

#[cfg(feature = "camera")]
mod camera {
    use super::FrameSource;
    use crate::pipeline::CaptureError;
    use image::RgbImage;
    use log::info;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;

    /// Local webcam; the stream closes when the source is dropped.
    pub struct CameraSource {
        camera: Camera,
        resolution: (u32, u32),
    }

    impl CameraSource {
        pub fn open(index: u32) -> Result<Self, CaptureError> {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(CameraIndex::Index(index), requested)
                .map_err(|e| CaptureError::Open(e.to_string()))?;
            camera
                .open_stream()
                .map_err(|e| CaptureError::Open(e.to_string()))?;
            let res = camera.resolution();
            let resolution = (res.width(), res.height());
            info!(
                "camera {} streaming at {}x{}",
                index, resolution.0, resolution.1
            );
            Ok(Self { camera, resolution })
        }
    }

    impl FrameSource for CameraSource {
        fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
            let frame = self
                .camera
                .frame()
                .map_err(|e| CaptureError::Read(e.to_string()))?;
            let img = frame
                .decode_image::<RgbFormat>()
                .map_err(|e| CaptureError::Read(e.to_string()))?;
            Ok(Some(img))
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            Some(self.resolution)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_frames_come_back_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, v) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            RgbImage::from_pixel(8, 6, image::Rgb([v, v, v]))
                .save(dir.path().join(name))
                .expect("save");
        }
        fs::write(dir.path().join("notes.txt"), "not a frame").expect("write");

        let mut src = ImageDirSource::open(dir.path())
            .expect("open")
            .with_frame_interval(Duration::from_millis(40));
        assert_eq!(src.len(), 3);
        let mut values = Vec::new();
        let mut times = Vec::new();
        while let Some(frame) = src.next_frame().expect("frame") {
            values.push(frame.get_pixel(0, 0)[0]);
            times.push(src.frame_time());
        }
        assert_eq!(values, vec![10, 20, 30]);
        assert_eq!(src.resolution(), Some((8, 6)));
        assert_eq!(times[2] - times[0], Duration::from_millis(80));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            ImageDirSource::open(dir.path()),
            Err(CaptureError::Empty(_))
        ));
    }

    #[test]
    fn gray_conversion_keeps_size() {
        let img = RgbImage::from_pixel(5, 4, image::Rgb([100, 100, 100]));
        let gray = gray_from_rgb(&img).expect("gray");
        assert_eq!((gray.width, gray.height), (5, 4));
        assert_eq!(gray.get(2, 2), 100);
    }
}
