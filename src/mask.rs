//! Rasterized text masks.
//!
//! A [`Mask`] is the pixel buffer the sampler reads: RGBA8, row-major, origin
//! at the top-left corner. Only the alpha channel decides whether a pixel is
//! part of the text, so callers can rasterize in any colour.
//!
//! ```ignore
//! let mask = Mask::from_file("assets/hello.png")?;
//! let population = sample(&mask, 2, 10)?;
//! ```

use std::path::Path;

use crate::error::SampleError;

/// An RGBA8 pixel buffer describing which pixels belong to the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    /// Wrap raw RGBA data (4 bytes per pixel, row-major, top-left origin).
    ///
    /// Returns [`SampleError::MaskSize`] if `data` does not hold exactly
    /// `width * height * 4` bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, SampleError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(SampleError::MaskSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Build a mask from a closure returning the alpha of each pixel.
    ///
    /// Colour channels are set to white.
    pub fn from_alpha_fn(width: u32, height: u32, mut alpha: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[255, 255, 255, alpha(x, y)]);
            }
        }
        Self { data, width, height }
    }

    /// A mask where every pixel has the same alpha.
    pub fn filled(width: u32, height: u32, alpha: u8) -> Self {
        Self::from_alpha_fn(width, height, |_, _| alpha)
    }

    /// Load a mask from an image file, converting it to RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SampleError> {
        let img = image::open(path.as_ref())?.into_rgba8();
        let (width, height) = img.dimensions();
        log::debug!(
            "loaded mask '{}' ({}x{})",
            path.as_ref().display(),
            width,
            height
        );
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True if the mask has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes.
    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    /// Alpha of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the mask.
    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.data[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }

    /// Count pixels whose alpha is strictly above `threshold`.
    pub fn coverage(&self, threshold: u8) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] > threshold).count()
    }
}
