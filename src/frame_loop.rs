//! Drives an engine one frame at a time from a [`FrameClock`].

use crate::engine::{FrameStats, ParticleEngine};
use crate::error::EngineError;
use crate::time::FrameClock;

/// Owns the clock and feeds its deltas to an engine.
///
/// The loop does not own the engine, so the same loop type drives a
/// [`GpuEngine`](crate::GpuEngine) from window redraws or a
/// [`HeadlessEngine`](crate::HeadlessEngine) from a plain `for` loop.
#[derive(Debug, Default)]
pub struct FrameLoop {
    clock: FrameClock,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: FrameClock) -> Self {
        Self { clock }
    }

    /// Start the engine. Calling again while running has no effect.
    pub fn start<E: ParticleEngine + ?Sized>(&mut self, engine: &mut E) {
        if engine.is_running() {
            return;
        }
        self.clock.reset();
        engine.start();
    }

    /// Run one frame: resize if needed, then tick with the clock's delta.
    pub fn frame<E: ParticleEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<FrameStats, EngineError> {
        if !engine.state().is_alive() {
            return Ok(FrameStats::idle());
        }
        let dt = self.clock.update();
        engine.resize_surface_if_needed();
        engine.tick(dt)
    }

    /// Run `frames` frames back to back and total their work.
    pub fn run<E: ParticleEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        frames: u32,
    ) -> Result<FrameStats, EngineError> {
        let mut total = FrameStats::idle();
        for _ in 0..frames {
            total += self.frame(engine)?;
        }
        Ok(total)
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::headless::HeadlessEngine;
    use crate::particle::{ParticleRecord, Population};

    #[test]
    fn test_run_totals_frames() {
        let mut engine = HeadlessEngine::default();
        let pop: Population = (0..10)
            .map(|_| ParticleRecord::new(Vec2::ZERO, 0.1, 1.0))
            .collect();
        engine.set_particles(&pop).unwrap();

        let mut frame_loop = FrameLoop::with_clock(FrameClock::fixed(1.0 / 60.0));
        frame_loop.start(&mut engine);
        let total = frame_loop.run(&mut engine, 5).unwrap();
        assert_eq!(total.dispatches, 5);
        assert_eq!(total.instances, 50);
        assert!((engine.state().time() - 5.0 / 60.0).abs() < 1e-5);
    }

    #[test]
    fn test_dead_engine_is_not_ticked() {
        let mut engine = HeadlessEngine::default();
        let mut frame_loop = FrameLoop::with_clock(FrameClock::fixed(0.01));
        frame_loop.start(&mut engine);
        engine.destroy();
        assert!(frame_loop.frame(&mut engine).unwrap().is_idle());
        assert_eq!(frame_loop.clock().frame(), 0);
    }
}
