//! Per-frame uniform blocks shared with the WGSL shaders.
//!
//! Both structs are `#[repr(C)]` and mirror the `SimUniforms` and
//! `RenderUniforms` declarations in `shaders/simulate.wgsl` and
//! `shaders/particles.wgsl` field for field. They are rewritten whole every
//! tick.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::physics::ForceModel;

/// Compute-pass uniforms: timing, pointer, population size and force model.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimUniforms {
    pub delta_time: f32,
    pub time: f32,
    /// Pointer in normalized device coordinates, Y up.
    pub pointer: [f32; 2],
    /// 1 while the pointer is pressed, 0 otherwise.
    pub pointer_pressed: u32,
    pub particle_count: u32,
    pub spring: f32,
    pub damping: f32,
    pub noise_strength: f32,
    pub noise_frequency: f32,
    pub pointer_strength: f32,
    pub pointer_radius: f32,
    pub max_speed: f32,
    pub _padding: [f32; 3],
}

impl SimUniforms {
    pub fn new(
        delta_time: f32,
        time: f32,
        pointer: Vec2,
        pressed: bool,
        particle_count: u32,
        forces: &ForceModel,
    ) -> Self {
        Self {
            delta_time,
            time,
            pointer: pointer.to_array(),
            pointer_pressed: pressed as u32,
            particle_count,
            spring: forces.spring,
            damping: forces.damping,
            noise_strength: forces.noise_strength,
            noise_frequency: forces.noise_frequency,
            pointer_strength: forces.pointer_strength,
            pointer_radius: forces.pointer_radius,
            max_speed: forces.max_speed,
            _padding: [0.0; 3],
        }
    }

    #[inline]
    pub fn pointer(&self) -> Vec2 {
        Vec2::from_array(self.pointer)
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pointer_pressed != 0
    }
}

/// Render-pass uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    /// Surface size in physical pixels.
    pub canvas_size: [f32; 2],
    /// Particle quad width in physical pixels.
    pub particle_size: f32,
    pub time: f32,
}

impl RenderUniforms {
    pub fn new(width: u32, height: u32, particle_size: f32, time: f32) -> Self {
        Self {
            canvas_size: [width.max(1) as f32, height.max(1) as f32],
            particle_size,
            time,
        }
    }

    /// Half-extent of a particle quad in NDC along each axis.
    pub fn half_extent_ndc(&self) -> Vec2 {
        Vec2::splat(self.particle_size) / Vec2::from_array(self.canvas_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<SimUniforms>(), 64);
        assert_eq!(std::mem::size_of::<RenderUniforms>(), 16);
    }

    #[test]
    fn test_sim_uniform_bytes() {
        let u = SimUniforms::new(0.5, 2.0, Vec2::new(-1.0, 1.0), true, 7, &ForceModel::default());
        let words: &[u32] = bytemuck::cast_slice(bytemuck::bytes_of(&u));
        assert_eq!(f32::from_bits(words[0]), 0.5);
        assert_eq!(f32::from_bits(words[1]), 2.0);
        assert_eq!(f32::from_bits(words[2]), -1.0);
        assert_eq!(f32::from_bits(words[3]), 1.0);
        assert_eq!(words[4], 1);
        assert_eq!(words[5], 7);
        assert!(u.is_pressed());
    }

    #[test]
    fn test_render_uniforms_never_zero_sized() {
        let u = RenderUniforms::new(0, 0, 3.0, 0.0);
        assert_eq!(u.canvas_size, [1.0, 1.0]);
    }

    #[test]
    fn test_half_extent() {
        // A 4px quad on an 800x400 canvas: 4/800 and 4/400 of the [-1, 1] range
        let u = RenderUniforms::new(800, 400, 4.0, 0.0);
        let half = u.half_extent_ndc();
        assert!((half.x - 0.005).abs() < 1e-7);
        assert!((half.y - 0.01).abs() < 1e-7);
    }
}
