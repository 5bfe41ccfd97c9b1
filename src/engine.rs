//! The engine abstraction shared by the GPU and headless backends.
//!
//! A [`ParticleEngine`] owns a particle population and advances it one frame
//! per [`tick`](ParticleEngine::tick). The frame loop itself lives outside the
//! engine (see [`FrameLoop`](crate::FrameLoop)); engines only react to
//! population swaps, pointer updates and ticks.
//!
//! All mutable frame-loop state (elapsed time, pointer, running/alive flags,
//! visual and force parameters) lives in one [`EngineState`] value per engine.

use std::ops::AddAssign;

use glam::Vec2;

use crate::error::EngineError;
use crate::particle::Population;
use crate::physics::ForceModel;
use crate::shader::workgroup_count;
use crate::uniforms::SimUniforms;

/// Smallest and largest accepted particle sizes in pixels.
pub const PARTICLE_SIZE_RANGE: (f32, f32) = (1.0, 64.0);

/// Engine construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Width of each particle sprite in physical pixels.
    pub particle_size_px: f32,
    pub forces: ForceModel,
    /// Background the render pass clears to.
    pub clear_color: wgpu::Color,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_size_px: 3.0,
            forces: ForceModel::default(),
            clear_color: wgpu::Color::BLACK,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sprite size, clamped to [`PARTICLE_SIZE_RANGE`].
    pub fn with_particle_size(mut self, size_px: f32) -> Self {
        self.particle_size_px = clamp_particle_size(size_px);
        self
    }

    pub fn with_forces(mut self, forces: ForceModel) -> Self {
        self.forces = forces;
        self
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }
}

fn clamp_particle_size(size_px: f32) -> f32 {
    if size_px.is_nan() {
        return PARTICLE_SIZE_RANGE.0;
    }
    size_px.clamp(PARTICLE_SIZE_RANGE.0, PARTICLE_SIZE_RANGE.1)
}

/// GPU work issued by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Compute dispatch calls.
    pub dispatches: u32,
    /// Workgroups across all dispatches.
    pub workgroups: u32,
    /// Draw calls.
    pub draw_calls: u32,
    /// Particle instances drawn.
    pub instances: u32,
}

impl FrameStats {
    /// A tick that did nothing.
    pub fn idle() -> Self {
        Self::default()
    }

    /// One dispatch and one instanced draw covering `particle_count`.
    pub fn for_population(particle_count: u32) -> Self {
        Self {
            dispatches: 1,
            workgroups: workgroup_count(particle_count),
            draw_calls: 1,
            instances: particle_count,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.dispatches == 0 && self.draw_calls == 0
    }
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: Self) {
        self.dispatches += rhs.dispatches;
        self.workgroups += rhs.workgroups;
        self.draw_calls += rhs.draw_calls;
        self.instances += rhs.instances;
    }
}

/// Frame-loop state owned by an engine.
///
/// Created fresh on initialize; [`kill`](Self::kill) clears it on destroy.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    time: f32,
    frame: u64,
    pointer: Vec2,
    pressed: bool,
    running: bool,
    alive: bool,
    particle_count: u32,
    particle_size: f32,
    forces: ForceModel,
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            time: 0.0,
            frame: 0,
            pointer: Vec2::ZERO,
            pressed: false,
            running: false,
            alive: true,
            particle_count: 0,
            particle_size: clamp_particle_size(config.particle_size_px),
            forces: config.forces,
        }
    }

    /// Mark the engine as running. Returns `false` if it already was.
    pub fn start(&mut self) -> bool {
        if self.running || !self.alive {
            return false;
        }
        self.running = true;
        true
    }

    /// Record pointer state in NDC. Values outside `[-1, 1]` are kept as is.
    pub fn update_pointer(&mut self, x: f32, y: f32, pressed: bool) {
        if !self.alive {
            return;
        }
        self.pointer = Vec2::new(x, y);
        self.pressed = pressed;
    }

    /// Advance the clock by `delta_time` and build this frame's uniforms.
    pub fn advance(&mut self, delta_time: f32) -> SimUniforms {
        let dt = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.time += dt;
        self.frame += 1;
        SimUniforms::new(
            dt,
            self.time,
            self.pointer,
            self.pressed,
            self.particle_count,
            &self.forces,
        )
    }

    /// Whether a tick should do any GPU work at all.
    pub fn should_tick(&self) -> bool {
        self.alive && self.running
    }

    /// Clear the state for teardown. Returns `false` if already dead.
    pub fn kill(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.running = false;
        self.pressed = false;
        self.particle_count = 0;
        true
    }

    pub fn set_particle_count(&mut self, count: usize) {
        self.particle_count = u32::try_from(count).unwrap_or(u32::MAX);
    }

    pub fn set_particle_size(&mut self, size_px: f32) {
        self.particle_size = clamp_particle_size(size_px);
    }

    pub fn set_forces(&mut self, forces: ForceModel) {
        self.forces = forces;
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    #[inline]
    pub fn particle_size(&self) -> f32 {
        self.particle_size
    }

    #[inline]
    pub fn forces(&self) -> &ForceModel {
        &self.forces
    }
}

/// A particle simulation backend driven one frame at a time.
///
/// Implemented by [`GpuEngine`](crate::GpuEngine) for on-screen rendering and
/// by [`HeadlessEngine`](crate::HeadlessEngine) for tests and tools.
pub trait ParticleEngine {
    fn state(&self) -> &EngineState;

    fn state_mut(&mut self) -> &mut EngineState;

    /// Replace the population. Dynamics restart at rest on each anchor.
    fn set_particles(&mut self, population: &Population) -> Result<(), EngineError>;

    /// Advance the simulation by `delta_time` seconds and draw it.
    ///
    /// Does nothing before [`start`](Self::start), after
    /// [`destroy`](Self::destroy), or while the population is empty. Time
    /// does not advance until the engine has been started, so a frame loop
    /// must call `start` once before its first tick.
    fn tick(&mut self, delta_time: f32) -> Result<FrameStats, EngineError>;

    /// Release every resource. Safe to call more than once.
    fn destroy(&mut self);

    /// Replace the population from its packed form.
    ///
    /// Rejects arrays whose length is not a multiple of
    /// [`FLOATS_PER_PARTICLE`](crate::FLOATS_PER_PARTICLE) before touching any
    /// engine state.
    fn set_packed(&mut self, packed: &[f32]) -> Result<(), EngineError> {
        let population = Population::from_packed(packed)?;
        self.set_particles(&population)
    }

    /// Match the output surface to the target's current size.
    ///
    /// Returns `true` if the surface was reconfigured.
    fn resize_surface_if_needed(&mut self) -> bool {
        false
    }

    /// Begin ticking. Idempotent.
    fn start(&mut self) {
        if self.state_mut().start() {
            log::info!("frame loop started");
        }
    }

    /// Record the pointer for the next tick. `x`, `y` in NDC.
    fn update_pointer(&mut self, x: f32, y: f32, pressed: bool) {
        self.state_mut().update_pointer(x, y, pressed);
    }

    fn set_particle_size(&mut self, size_px: f32) {
        self.state_mut().set_particle_size(size_px);
    }

    fn set_force_model(&mut self, forces: ForceModel) {
        self.state_mut().set_forces(forces);
    }

    fn particle_count(&self) -> u32 {
        self.state().particle_count()
    }

    fn is_running(&self) -> bool {
        self.state().is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_idempotent() {
        let mut state = EngineState::new(&EngineConfig::default());
        assert!(state.start());
        assert!(!state.start());
        assert!(state.is_running());
    }

    #[test]
    fn test_advance_accumulates_time() {
        let mut state = EngineState::new(&EngineConfig::default());
        state.update_pointer(0.5, -0.25, true);
        state.advance(0.25);
        let u = state.advance(0.5);
        assert_eq!(u.time, 0.75);
        assert_eq!(u.delta_time, 0.5);
        assert_eq!(u.pointer, [0.5, -0.25]);
        assert_eq!(u.pointer_pressed, 1);
        assert_eq!(state.frame(), 2);
    }

    #[test]
    fn test_advance_ignores_bad_delta() {
        let mut state = EngineState::new(&EngineConfig::default());
        assert_eq!(state.advance(-1.0).delta_time, 0.0);
        assert_eq!(state.advance(f32::NAN).delta_time, 0.0);
        assert_eq!(state.time(), 0.0);
    }

    #[test]
    fn test_kill_clears_state_once() {
        let mut state = EngineState::new(&EngineConfig::default());
        state.start();
        state.set_particle_count(10);
        assert!(state.kill());
        assert!(!state.kill());
        assert!(!state.should_tick());
        assert_eq!(state.particle_count(), 0);
        // Dead engines cannot be restarted
        assert!(!state.start());
    }

    #[test]
    fn test_particle_size_clamped() {
        let config = EngineConfig::new().with_particle_size(500.0);
        assert_eq!(config.particle_size_px, PARTICLE_SIZE_RANGE.1);
        let mut state = EngineState::new(&config);
        state.set_particle_size(0.0);
        assert_eq!(state.particle_size(), PARTICLE_SIZE_RANGE.0);
    }

    #[test]
    fn test_frame_stats() {
        assert!(FrameStats::idle().is_idle());
        let stats = FrameStats::for_population(1000);
        assert_eq!(stats.workgroups, 4);
        assert_eq!(stats.instances, 1000);

        let mut total = FrameStats::idle();
        total += stats;
        total += stats;
        assert_eq!(total.dispatches, 2);
        assert_eq!(total.draw_calls, 2);
    }
}
