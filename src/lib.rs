//! # textboom - text rendered as a field of GPU particles
//!
//! Turns a rasterized text mask into thousands of particles that rest on the
//! glyph shapes, wobble gently, scatter away from the pointer while it is
//! pressed, and spring back home when released.
//!
//! The crate has two halves:
//!
//! - **Sampling** ([`Mask`], [`SamplerConfig`]) turns an RGBA mask into a
//!   [`Population`] of particles, either on a regular grid over the filled
//!   glyphs or along their outline.
//! - **Engines** ([`ParticleEngine`]) own a population and advance it one
//!   frame per tick. [`GpuEngine`] runs a wgpu compute pass followed by an
//!   instanced draw into a window surface; [`HeadlessEngine`] runs the same
//!   force model on the CPU.
//!
//! ## Quick Start
//!
//! ```ignore
//! use textboom::prelude::*;
//!
//! let mask = Mask::from_file("title.png")?;
//! let population = SamplerConfig::new().with_stride(2).sample(&mask)?;
//!
//! let mut engine = GpuEngine::initialize(window, EngineConfig::default())?;
//! engine.set_particles(&population)?;
//!
//! let mut frame_loop = FrameLoop::new();
//! frame_loop.start(&mut engine);
//! // on every redraw:
//! frame_loop.frame(&mut engine)?;
//! ```
//!
//! ## Particle layout
//!
//! Each particle is two 16-byte halves stored in separate GPU buffers:
//!
//! | Half | Fields | Compute | Render |
//! |------|--------|---------|--------|
//! | [`Anchor`] | home.xy, seed, intensity | read | read |
//! | [`Dynamics`] | position.xy, velocity.xy | read/write | read |
//!
//! The packed form ([`Population::to_packed`]) interleaves them as eight
//! floats per particle, anchor first.

pub mod display;
pub mod engine;
pub mod error;
pub mod frame_loop;
mod gpu;
pub mod headless;
pub mod input;
pub mod mask;
pub mod outline;
pub mod particle;
pub mod physics;
pub mod sampler;
pub mod shader;
pub mod time;
pub mod uniforms;

pub use display::{backing_size, DisplayTarget};
pub use engine::{EngineConfig, EngineState, FrameStats, ParticleEngine};
pub use error::{EngineError, SampleError};
pub use frame_loop::FrameLoop;
pub use glam::Vec2;
pub use gpu::{storage_size, GpuEngine, QuadVertex, QUAD_VERTICES};
pub use headless::HeadlessEngine;
pub use input::{PointerInput, PointerState};
pub use mask::Mask;
pub use outline::OutlineConfig;
pub use particle::{Anchor, Dynamics, ParticleRecord, Population, FLOATS_PER_PARTICLE};
pub use physics::ForceModel;
pub use sampler::{sample, SampleMode, SamplerConfig, DEFAULT_SEED};
pub use time::FrameClock;
pub use uniforms::{RenderUniforms, SimUniforms};

/// Convenient imports for applications.
pub mod prelude {
    pub use crate::engine::{EngineConfig, FrameStats, ParticleEngine};
    pub use crate::error::{EngineError, SampleError};
    pub use crate::frame_loop::FrameLoop;
    pub use crate::gpu::GpuEngine;
    pub use crate::headless::HeadlessEngine;
    pub use crate::mask::Mask;
    pub use crate::outline::OutlineConfig;
    pub use crate::particle::Population;
    pub use crate::physics::ForceModel;
    pub use crate::sampler::{SampleMode, SamplerConfig};
    pub use crate::time::FrameClock;
    pub use crate::Vec2;
}
