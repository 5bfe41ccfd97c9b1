//! WGSL sources for the compute and render pipelines.

/// Particle update compute shader. Entry point `main`.
pub const SIMULATE_SOURCE: &str = include_str!("shaders/simulate.wgsl");

/// Instanced sprite shader. Entry points `vs_main` and `fs_main`.
pub const PARTICLES_SOURCE: &str = include_str!("shaders/particles.wgsl");

/// Invocations per compute workgroup; must match `@workgroup_size` in
/// `simulate.wgsl`.
pub const WORKGROUP_SIZE: u32 = 256;

/// Workgroups needed to cover `particle_count` particles. The last group may
/// be partially filled.
#[inline]
pub fn workgroup_count(particle_count: u32) -> u32 {
    particle_count.div_ceil(WORKGROUP_SIZE)
}
