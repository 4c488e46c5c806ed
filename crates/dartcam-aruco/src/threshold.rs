//! Global (Otsu) and local (adaptive mean) thresholding.

use dartcam_core::{GrayImage, GrayImageView, MASK_ON};

/// Otsu threshold of a sample set. Values strictly below it count as dark.
pub(crate) fn otsu_threshold(samples: &[u8]) -> u8 {
    let Some((&min_v, &max_v)) = samples
        .iter()
        .min()
        .zip(samples.iter().max())
    else {
        return 127;
    };
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16 + 1) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            // first bin of the bright class
            best_t = (t + 1).min(255) as u8;
        }
    }

    best_t
}

/// Inverted adaptive mean threshold: a pixel is foreground when it is darker
/// than the mean of its `window × window` neighbourhood by more than `c`.
///
/// The window is clipped at the image border.
pub fn adaptive_threshold_inv(img: &GrayImageView<'_>, window: usize, c: f32) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = GrayImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }
    let half = (window.max(3) / 2) as i64;

    // integral image with a zero row/column in front
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += img.data[y * w + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    for y in 0..h {
        let y0 = (y as i64 - half).max(0) as usize;
        let y1 = (y as i64 + half + 1).min(h as i64) as usize;
        for x in 0..w {
            let x0 = (x as i64 - half).max(0) as usize;
            let x1 = (x as i64 + half + 1).min(w as i64) as usize;
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as f32;
            let mean = sum as f32 / count;
            if (img.data[y * w + x] as f32) < mean - c {
                out.data[y * w + x] = MASK_ON;
            }
        }
    }

    out
}
