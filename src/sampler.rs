//! Mask-to-particle sampling.
//!
//! The sampler walks a [`Mask`] and emits one [`ParticleRecord`] per accepted
//! location. Two strategies are available:
//!
//! - [`SampleMode::Grid`] visits every `stride`-th pixel on both axes and keeps
//!   those whose alpha reaches the threshold. Fills the glyphs evenly.
//! - [`SampleMode::Outline`] traces a double contour around the glyphs, see
//!   [`crate::outline`].
//!
//! # Coordinate mapping
//!
//! Image space has its origin at the top-left corner with Y pointing down.
//! Simulation space is centred with Y pointing up and spans `-1..1` on both
//! axes, so the mask always fills the canvas:
//!
//! ```text
//! sx = (px / width) * 2 - 1
//! sy = 1 - (py / height) * 2
//! ```
//!
//! Grid samples use the pixel centre (`x + 0.5`, `y + 0.5`).
//!
//! # Example
//!
//! ```ignore
//! let population = SamplerConfig::new()
//!     .with_stride(3)
//!     .with_alpha_threshold(32)
//!     .sample(&mask)?;
//! ```

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::SampleError;
use crate::mask::Mask;
use crate::outline::{self, OutlineConfig};
use crate::particle::{ParticleRecord, Population};

/// Seed used when none is configured, so repeated runs produce the same field.
pub const DEFAULT_SEED: u64 = 0xA3C5_1F2D;

/// Sampling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SampleMode {
    /// Regular lattice over the filled glyph area.
    #[default]
    Grid,
    /// Jittered, relaxed points along a double contour of the glyphs.
    Outline(OutlineConfig),
}

/// Sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Distance in pixels between sampled grid points. Must be at least 1.
    pub stride: u32,
    /// Minimum alpha for a grid point to produce a particle.
    pub alpha_threshold: u8,
    /// Seed for per-particle randomness.
    pub seed: u64,
    pub mode: SampleMode,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            alpha_threshold: 10,
            seed: DEFAULT_SEED,
            mode: SampleMode::Grid,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_mode(mut self, mode: SampleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sample `mask` with these settings.
    pub fn sample(&self, mask: &Mask) -> Result<Population, SampleError> {
        if self.stride == 0 {
            return Err(SampleError::InvalidStride(self.stride));
        }
        if mask.is_empty() {
            return Ok(Population::new());
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let population = match self.mode {
            SampleMode::Grid => sample_grid(mask, self.stride, self.alpha_threshold, &mut rng),
            SampleMode::Outline(config) => {
                outline::sample_outline(mask, self.stride, self.alpha_threshold, &config, &mut rng)
            }
        };

        log::debug!(
            "sampled {} particles from {}x{} mask (stride {}, threshold {}, {:?})",
            population.len(),
            mask.width(),
            mask.height(),
            self.stride,
            self.alpha_threshold,
            self.mode
        );
        Ok(population)
    }
}

/// Grid-sample `mask` with the default seed.
///
/// Shorthand for `SamplerConfig::new().with_stride(stride).with_alpha_threshold(alpha_threshold).sample(mask)`.
pub fn sample(mask: &Mask, stride: u32, alpha_threshold: u8) -> Result<Population, SampleError> {
    SamplerConfig::new()
        .with_stride(stride)
        .with_alpha_threshold(alpha_threshold)
        .sample(mask)
}

/// Map a point in image space (pixels, Y-down) to simulation space.
#[inline]
pub fn to_simulation_space(px: f32, py: f32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (px / width as f32) * 2.0 - 1.0,
        1.0 - (py / height as f32) * 2.0,
    )
}

/// Number of lattice points visited for a `width`x`height` mask.
#[inline]
pub fn grid_points(width: u32, height: u32, stride: u32) -> usize {
    width.div_ceil(stride) as usize * height.div_ceil(stride) as usize
}

fn sample_grid(mask: &Mask, stride: u32, threshold: u8, rng: &mut SmallRng) -> Population {
    let (width, height) = (mask.width(), mask.height());
    let step = stride as usize;
    let mut records = Vec::with_capacity(grid_points(width, height, stride));

    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            let alpha = mask.alpha(x, y);
            if alpha < threshold {
                continue;
            }
            let home = to_simulation_space(x as f32 + 0.5, y as f32 + 0.5, width, height);
            records.push(ParticleRecord::new(home, rng.gen(), alpha as f32 / 255.0));
        }
    }

    Population::from_records(records)
}
