//! CPU engine with no window or GPU.
//!
//! Runs the same force model as the compute shader (via [`physics::step`]) on
//! the host, one particle at a time. Useful for tests, tooling, and checking
//! that a population settles before putting it on screen.

use crate::engine::{EngineConfig, EngineState, FrameStats, ParticleEngine};
use crate::error::EngineError;
use crate::particle::{ParticleRecord, Population};
use crate::physics;
use crate::uniforms::RenderUniforms;

/// Host-side [`ParticleEngine`].
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    state: EngineState,
    records: Vec<ParticleRecord>,
    canvas: (u32, u32),
    render: RenderUniforms,
}

impl HeadlessEngine {
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState::new(&config);
        let canvas = (800, 600);
        let render = RenderUniforms::new(canvas.0, canvas.1, state.particle_size(), 0.0);
        Self {
            state,
            records: Vec::new(),
            canvas,
            render,
        }
    }

    /// Current particles, anchors and dynamics.
    pub fn particles(&self) -> &[ParticleRecord] {
        &self.records
    }

    /// Snapshot the current particles, including their motion.
    pub fn snapshot(&self) -> Population {
        Population::from_records(self.records.clone())
    }

    /// Largest distance of any particle from its home.
    pub fn max_displacement(&self) -> f32 {
        self.records
            .iter()
            .map(ParticleRecord::displacement)
            .fold(0.0, f32::max)
    }

    /// Pretend-surface size used for the render uniforms.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas = (width, height);
    }

    /// Render uniforms the last tick would have uploaded.
    pub fn render_uniforms(&self) -> &RenderUniforms {
        &self.render
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ParticleEngine for HeadlessEngine {
    fn state(&self) -> &EngineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    fn set_particles(&mut self, population: &Population) -> Result<(), EngineError> {
        if !self.state.is_alive() {
            log::warn!("set_particles on a destroyed engine ignored");
            return Ok(());
        }
        self.records = population.rest_records();
        self.state.set_particle_count(self.records.len());
        log::debug!("headless population set to {} particles", self.records.len());
        Ok(())
    }

    fn tick(&mut self, delta_time: f32) -> Result<FrameStats, EngineError> {
        if !self.state.should_tick() {
            return Ok(FrameStats::idle());
        }
        let uniforms = self.state.advance(delta_time);
        self.render = RenderUniforms::new(
            self.canvas.0,
            self.canvas.1,
            self.state.particle_size(),
            uniforms.time,
        );
        if self.records.is_empty() {
            return Ok(FrameStats::idle());
        }

        for record in &mut self.records {
            record.dynamics = physics::step(&record.anchor, &record.dynamics, &uniforms);
        }

        Ok(FrameStats::for_population(self.state.particle_count()))
    }

    fn destroy(&mut self) {
        if self.state.kill() {
            self.records = Vec::new();
            log::debug!("headless engine destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn population(n: usize) -> Population {
        (0..n)
            .map(|i| ParticleRecord::new(Vec2::new(i as f32 * 0.01, 0.0), 0.5, 1.0))
            .collect()
    }

    #[test]
    fn test_tick_before_start_is_idle() {
        let mut engine = HeadlessEngine::default();
        engine.set_particles(&population(4)).unwrap();
        assert!(engine.tick(1.0 / 60.0).unwrap().is_idle());
        assert_eq!(engine.state().time(), 0.0);
    }

    #[test]
    fn test_tick_steps_every_particle() {
        let mut engine = HeadlessEngine::default();
        engine.set_particles(&population(300)).unwrap();
        engine.start();
        engine.update_pointer(0.0, 0.0, true);
        let stats = engine.tick(1.0 / 60.0).unwrap();
        assert_eq!(stats, FrameStats::for_population(300));
        assert_eq!(stats.workgroups, 2);
        assert!(engine.max_displacement() > 0.0);
    }

    #[test]
    fn test_empty_population_does_nothing() {
        let mut engine = HeadlessEngine::default();
        engine.start();
        assert!(engine.tick(1.0 / 60.0).unwrap().is_idle());
    }

    #[test]
    fn test_set_particles_resets_motion() {
        let mut engine = HeadlessEngine::default();
        let pop = population(10);
        engine.set_particles(&pop).unwrap();
        engine.start();
        engine.update_pointer(0.05, 0.0, true);
        for _ in 0..10 {
            engine.tick(1.0 / 60.0).unwrap();
        }
        assert!(engine.max_displacement() > 0.0);

        engine.set_particles(&pop).unwrap();
        assert_eq!(engine.max_displacement(), 0.0);
    }

    #[test]
    fn test_render_uniforms_follow_canvas() {
        let mut engine = HeadlessEngine::new(EngineConfig::new().with_particle_size(4.0));
        engine.set_canvas_size(1024, 512);
        engine.set_particles(&population(1)).unwrap();
        engine.start();
        engine.tick(0.01).unwrap();
        let u = engine.render_uniforms();
        assert_eq!(u.canvas_size, [1024.0, 512.0]);
        assert_eq!(u.particle_size, 4.0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut engine = HeadlessEngine::default();
        engine.set_particles(&population(3)).unwrap();
        engine.start();
        engine.destroy();
        engine.destroy();
        assert!(engine.particles().is_empty());
        assert!(engine.tick(0.01).unwrap().is_idle());
    }
}
