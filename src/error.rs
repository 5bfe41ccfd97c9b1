//! Error types for textboom.
//!
//! Engine errors cover GPU initialization, surface handling and particle
//! uploads. Sampler errors cover malformed masks and parameters.

use thiserror::Error;

/// Errors raised by a [`ParticleEngine`](crate::ParticleEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// No compatible GPU adapter or device could be acquired.
    #[error("no compatible GPU device available: {0}")]
    DeviceUnavailable(String),

    /// The target surface could not be created or configured for presentation.
    #[error("failed to configure presentation surface: {0}")]
    SurfaceConfiguration(String),

    /// A packed particle array whose length is not a multiple of the record size.
    #[error(
        "packed particle buffer has {len} floats, expected a multiple of {}",
        crate::particle::FLOATS_PER_PARTICLE
    )]
    InvalidParticleBuffer { len: usize },

    /// GPU memory could not be allocated for the particle population.
    #[error("failed to allocate particle buffers for {count} particles: {reason}")]
    BufferAllocation { count: usize, reason: String },

    /// Acquiring the next surface texture failed unrecoverably.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Errors raised while building masks or sampling particles.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Stride must be at least one pixel.
    #[error("sampling stride must be >= 1, got {0}")]
    InvalidStride(u32),

    /// RGBA data length does not match the declared dimensions.
    #[error("mask data has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    MaskSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Failed to load a mask image from disk.
    #[error("failed to load mask image: {0}")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_buffer_message_names_record_size() {
        let err = EngineError::InvalidParticleBuffer { len: 13 };
        let msg = err.to_string();
        assert!(msg.contains("13"));
        assert!(msg.contains("multiple of 8"));
    }

    #[test]
    fn test_mask_size_message() {
        let err = SampleError::MaskSize {
            width: 2,
            height: 2,
            expected: 16,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "mask data has 12 bytes, expected 16 for 2x2 RGBA"
        );
    }
}
