//! Force model for the per-particle update.
//!
//! [`step`] is the CPU rendition of the compute shader in
//! `shaders/simulate.wgsl`. Both evaluate, for each particle:
//!
//! ```text
//! accel  = (home - pos) * spring
//!        + noise(seed, time) * noise_strength
//!        + push_away_from_pointer          (only while pressed)
//! vel    = vel * exp(-damping * dt) + accel * dt
//! vel    = clamp_length(vel, max_speed)
//! pos   += vel * dt
//! ```
//!
//! The pointer push falls off quadratically to zero at `pointer_radius`.
//! The spring never switches off, so released particles always drift home.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::particle::{Anchor, Dynamics};
use crate::uniforms::SimUniforms;

/// Below this distance the pointer push uses a seed-derived direction.
pub const POINTER_EPSILON: f32 = 1e-5;

/// Frames at 60 Hz within which a released particle is back home, for the
/// default [`ForceModel`].
pub const SETTLE_FRAMES: u32 = 300;

/// Tunable constants of the force model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceModel {
    /// Spring stiffness toward the anchor (1/s²).
    pub spring: f32,
    /// Exponential velocity decay rate (1/s).
    pub damping: f32,
    /// Amplitude of the ambient wobble acceleration.
    pub noise_strength: f32,
    /// Angular frequency of the wobble (rad/s).
    pub noise_frequency: f32,
    /// Peak pointer acceleration, reached at the pointer itself.
    pub pointer_strength: f32,
    /// Pointer influence radius in simulation units.
    pub pointer_radius: f32,
    /// Speed cap in simulation units per second.
    pub max_speed: f32,
}

impl Default for ForceModel {
    fn default() -> Self {
        Self {
            spring: 12.0,
            damping: 4.0,
            noise_strength: 0.02,
            noise_frequency: 1.3,
            pointer_strength: 40.0,
            pointer_radius: 0.4,
            max_speed: 3.0,
        }
    }
}

impl ForceModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spring(mut self, spring: f32, damping: f32) -> Self {
        self.spring = spring;
        self.damping = damping;
        self
    }

    pub fn with_noise(mut self, strength: f32, frequency: f32) -> Self {
        self.noise_strength = strength;
        self.noise_frequency = frequency;
        self
    }

    pub fn with_pointer(mut self, strength: f32, radius: f32) -> Self {
        self.pointer_strength = strength;
        self.pointer_radius = radius;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Damping ratio of the spring: below 1 particles overshoot once or twice
    /// before settling.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * self.spring.sqrt())
    }
}

/// Ambient wobble for a particle at `time`.
#[inline]
pub fn noise(seed: f32, time: f32, frequency: f32) -> Vec2 {
    let phase = seed * TAU;
    Vec2::new(
        (time * frequency + phase).sin(),
        (time * frequency * 1.37 + phase * 1.71).cos(),
    )
}

/// Unit vector used when a particle sits exactly under the pointer.
#[inline]
pub fn fallback_direction(seed: f32) -> Vec2 {
    let angle = seed * TAU;
    Vec2::new(angle.cos(), angle.sin())
}

/// Acceleration pushing a particle at `position` away from the pointer.
pub fn pointer_force(position: Vec2, seed: f32, uniforms: &SimUniforms) -> Vec2 {
    if !uniforms.is_pressed() || uniforms.pointer_radius <= 0.0 {
        return Vec2::ZERO;
    }
    let away = position - uniforms.pointer();
    let dist = away.length();
    if dist >= uniforms.pointer_radius {
        return Vec2::ZERO;
    }
    let dir = if dist > POINTER_EPSILON {
        away / dist
    } else {
        fallback_direction(seed)
    };
    let falloff = 1.0 - dist / uniforms.pointer_radius;
    dir * uniforms.pointer_strength * falloff * falloff
}

/// Advance one particle by `uniforms.delta_time`.
pub fn step(anchor: &Anchor, dynamics: &Dynamics, uniforms: &SimUniforms) -> Dynamics {
    let dt = uniforms.delta_time;
    let pos = dynamics.position;

    let mut accel = (anchor.home - pos) * uniforms.spring;
    accel += noise(anchor.seed, uniforms.time, uniforms.noise_frequency) * uniforms.noise_strength;
    accel += pointer_force(pos, anchor.seed, uniforms);

    let velocity = (dynamics.velocity * (-uniforms.damping * dt).exp() + accel * dt)
        .clamp_length_max(uniforms.max_speed);

    Dynamics {
        position: pos + velocity * dt,
        velocity,
    }
}
