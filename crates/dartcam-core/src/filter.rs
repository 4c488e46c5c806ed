//! Per-pixel and neighbourhood filters on [`GrayImage`].
//!
//! Blur and morphology run through `imageproc`; the buffers are converted at
//! the call boundary. Morphology treats any non-zero pixel as foreground.

use crate::image::{GrayImage, MASK_ON};
use ::image::{ImageBuffer, Luma};
use imageproc::distance_transform::Norm;
use nalgebra::Point2;

/// Sigma used for a `ksize` kernel when no sigma is given.
#[inline]
pub fn default_sigma_for_kernel(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Gaussian blur for an odd `ksize × ksize` window.
///
/// A non-positive `sigma` is derived from the kernel size; `imageproc` sizes
/// its own kernel from the sigma.
pub fn gaussian_blur(src: &GrayImage, ksize: usize, sigma: f32) -> GrayImage {
    let ksize = if ksize % 2 == 0 { ksize + 1 } else { ksize }.max(1);
    if ksize == 1 || src.data.is_empty() {
        return src.clone();
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_sigma_for_kernel(ksize)
    };

    let (w, h) = (src.width as u32, src.height as u32);
    let f = ImageBuffer::<Luma<f32>, Vec<f32>>::from_fn(w, h, |x, y| {
        Luma([src.get(x as usize, y as usize) as f32 / 255.0])
    });
    let blurred = imageproc::filter::gaussian_blur_f32(&f, sigma);
    let data = blurred
        .pixels()
        .map(|p| (p[0].clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Per-pixel `|a - b|`. Both images must have the same size.
pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert!(a.same_size(b), "abs_diff on mismatched images");
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&p, &q)| p.abs_diff(q))
        .collect();
    GrayImage {
        width: a.width,
        height: a.height,
        data,
    }
}

/// Binary threshold: `MASK_ON` where `v > thresh`, else `0`.
pub fn threshold_binary(src: &GrayImage, thresh: u8) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&v| if v > thresh { MASK_ON } else { 0 })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// 3×3 dilation applied `iterations` times (a square of radius `iterations`).
pub fn dilate(src: &GrayImage, iterations: usize) -> GrayImage {
    if iterations == 0 || src.data.is_empty() {
        return src.clone();
    }
    let k = iterations.min(u8::MAX as usize) as u8;
    GrayImage::from_luma(imageproc::morphology::dilate(&src.to_luma(), Norm::LInf, k))
}

/// 3×3 erosion applied `iterations` times (a square of radius `iterations`).
pub fn erode(src: &GrayImage, iterations: usize) -> GrayImage {
    if iterations == 0 || src.data.is_empty() {
        return src.clone();
    }
    let k = iterations.min(u8::MAX as usize) as u8;
    GrayImage::from_luma(imageproc::morphology::erode(&src.to_luma(), Norm::LInf, k))
}

/// Fill a solid disc of `radius` pixels with `value`, clipped to the image.
pub fn fill_disc(img: &mut GrayImage, center: Point2<f32>, radius: f32, value: u8) {
    if radius < 0.0 || !center.x.is_finite() || !center.y.is_finite() {
        return;
    }
    let cx = center.x.round() as i32;
    let cy = center.y.round() as i32;
    let r = radius.round() as i32;
    let r2 = r * r;
    for dy in -r..=r {
        let y = cy + dy;
        if y < 0 || y >= img.height as i32 {
            continue;
        }
        for dx in -r..=r {
            let x = cx + dx;
            if x < 0 || x >= img.width as i32 || dx * dx + dy * dy > r2 {
                continue;
            }
            img.data[y as usize * img.width + x as usize] = value;
        }
    }
}
