//! Lightweight 8-bit grayscale buffers.
//!
//! Row-major, one byte per pixel. Binary masks use `0` for background and
//! [`MASK_ON`] for foreground.

/// Foreground value of a binary mask.
pub const MASK_ON: u8 = 255;

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Errors raised when wrapping raw pixel buffers.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageBufferError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

impl GrayImage {
    /// Black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    /// Image filled with a constant value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageBufferError> {
        if width == 0 || height == 0 {
            return Err(ImageBufferError::InvalidDimensions { width, height });
        }
        let expected = width * height;
        if data.len() != expected {
            return Err(ImageBufferError::InvalidLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert packed RGB8 into luma with the BT.601 weights
    /// (`0.299 R + 0.587 G + 0.114 B`), in 16-bit fixed point.
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> Result<Self, ImageBufferError> {
        if width == 0 || height == 0 {
            return Err(ImageBufferError::InvalidDimensions { width, height });
        }
        let expected = width * height * 3;
        if rgb.len() != expected {
            return Err(ImageBufferError::InvalidLength {
                expected,
                got: rgb.len(),
            });
        }

        let data = rgb
            .chunks_exact(3)
            .map(|px| {
                let v = 19_595 * px[0] as u32 + 38_470 * px[1] as u32 + 7_471 * px[2] as u32;
                ((v + 32_768) >> 16) as u8
            })
            .collect();

        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Number of non-zero pixels.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    #[inline]
    pub fn same_size(&self, other: &GrayImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Copy into an `image` crate buffer for the `imageproc` operators.
    pub fn to_luma(&self) -> ::image::GrayImage {
        ::image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            ::image::Luma([self.get(x as usize, y as usize)])
        })
    }

    /// Take over the pixels of an `image` crate buffer.
    pub fn from_luma(img: ::image::GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Self {
            width: w as usize,
            height: h as usize,
            data: img.into_raw(),
        }
    }
}

impl GrayImageView<'_> {
    /// Pixel value, or `0` outside the image.
    #[inline]
    pub fn get_or_zero(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_bad_length() {
        let err = GrayImage::from_raw(4, 4, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            ImageBufferError::InvalidLength {
                expected: 16,
                got: 15
            }
        );
    }

    #[test]
    fn rgb_conversion_uses_bt601_weights() {
        let rgb = [255, 0, 0, 0, 255, 0, 0, 0, 255, 200, 200, 200];
        let gray = GrayImage::from_rgb(4, 1, &rgb).expect("valid buffer");
        assert_eq!(gray.data, vec![76, 150, 29, 200]);
    }

    #[test]
    fn luma_conversion_keeps_layout() {
        let img = GrayImage::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).expect("buffer");
        let luma = img.to_luma();
        assert_eq!(luma.dimensions(), (3, 2));
        assert_eq!(luma.get_pixel(2, 0)[0], 3);
        assert_eq!(luma.get_pixel(0, 1)[0], 4);
        assert_eq!(GrayImage::from_luma(luma), img);
    }
}
