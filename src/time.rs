//! Frame timing for the engine loop.
//!
//! [`FrameClock`] measures wall-clock delta time between frames, clamps it so
//! a stalled frame (window drag, breakpoint, hidden tab) cannot launch
//! particles across the screen, and keeps a running FPS estimate.
//!
//! ```ignore
//! use textboom::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.update();
//!     engine.tick(dt)?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Largest delta a single frame may report, in seconds.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 30.0;

/// Frame clock with delta clamping and FPS tracking.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Instant,
    /// Sum of reported deltas, so it matches what the engine integrated.
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// When set, every frame reports exactly this delta.
    fixed_delta: Option<f32>,
    max_delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
            max_delta: MAX_FRAME_DELTA,
        }
    }

    /// A clock that always reports `delta` seconds, for headless runs.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance one frame and return its clamped delta in seconds.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = match self.fixed_delta {
            Some(delta) => delta,
            None => now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.last_frame = now;
        self.delta_secs = raw.clamp(0.0, self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed every half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Pass `None` to go back to wall-clock timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }

    /// Restart timing from now. The next delta measures from this call.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.max_delta(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_clock_update() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(5));
        let dt = clock.update();
        assert!(dt > 0.0);
        assert_eq!(clock.frame(), 1);
        assert_eq!(clock.elapsed(), dt);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(100));
        let dt = clock.update();
        assert_eq!(dt, MAX_FRAME_DELTA);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);
        thread::sleep(Duration::from_millis(50));
        for _ in 0..3 {
            assert!((clock.update() - 1.0 / 60.0).abs() < 1e-7);
        }
        assert!((clock.elapsed() - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_fixed_delta_still_clamped() {
        let mut clock = FrameClock::fixed(1.0);
        assert_eq!(clock.update(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::fixed(0.01);
        clock.update();
        clock.update();
        clock.reset();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
