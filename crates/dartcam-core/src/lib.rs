//! Image buffers and geometric building blocks shared by the dartcam crates.
//!
//! Everything here works on plain 8-bit grayscale buffers ([`GrayImage`]) and
//! `nalgebra` points. Neighbourhood operators, border following and hull
//! geometry are `imageproc`'s; the buffers convert at the call boundary.
//!
//! - [`filter`]: blur, differencing, thresholding and 3×3 morphology.
//! - [`find_external_contours`]: outer borders of foreground regions.
//! - [`convex_hull`], [`min_area_rect`], [`approx_closed_polygon`]: point-set
//!   geometry used by tip estimation and marker quad finding.
//! - [`Homography`]: the board-plane ↔ camera-plane mapping.

mod contour;
pub mod filter;
mod geometry;
mod homography;
mod image;
mod logger;

pub use contour::{find_external_contours, min_point_distance, Contour};
pub use geometry::{
    approx_closed_polygon, convex_hull, is_convex, min_area_rect, polygon_area,
    polygon_perimeter, signed_polygon_area, triangle_area, RotatedRect,
};
pub use homography::{homography_from_4pt, Homography};
pub use image::{GrayImage, GrayImageView, ImageBufferError, MASK_ON};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
