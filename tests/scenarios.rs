//! End-to-end behaviour on the headless engine: sample a mask, upload it,
//! and drive frames through the frame loop.

use std::collections::HashSet;

use textboom::physics::SETTLE_FRAMES;
use textboom::prelude::*;
use textboom::{EngineError, FLOATS_PER_PARTICLE};

const DT: f32 = 1.0 / 60.0;

fn engine_with(mask: &Mask, stride: u32) -> (HeadlessEngine, FrameLoop, Population) {
    let population = SamplerConfig::new()
        .with_stride(stride)
        .with_alpha_threshold(10)
        .sample(mask)
        .unwrap();
    let mut engine = HeadlessEngine::default();
    engine.set_particles(&population).unwrap();
    let mut frame_loop = FrameLoop::with_clock(FrameClock::fixed(DT));
    frame_loop.start(&mut engine);
    (engine, frame_loop, population)
}

fn homes(population: &Population) -> HashSet<(u32, u32)> {
    population
        .iter()
        .map(|r| (r.anchor.home.x.to_bits(), r.anchor.home.y.to_bits()))
        .collect()
}

#[test]
fn test_full_mask_settles_at_anchors() {
    let mask = Mask::filled(100, 40, 255);
    let (mut engine, mut frame_loop, population) = engine_with(&mask, 2);
    assert_eq!(population.len(), 1000);

    // Knock the field out of place, then let it settle
    engine.update_pointer(0.0, 0.0, true);
    frame_loop.run(&mut engine, 30).unwrap();
    let disturbed = engine.max_displacement();
    assert!(disturbed > 0.05);

    engine.update_pointer(0.0, 0.0, false);
    frame_loop.run(&mut engine, 600).unwrap();
    let settled = engine.max_displacement();
    assert!(settled < 0.01, "settled displacement {}", settled);
    assert!(settled < disturbed);
}

#[test]
fn test_empty_mask_issues_no_gpu_work() {
    let mask = Mask::filled(64, 64, 0);
    let (mut engine, mut frame_loop, population) = engine_with(&mask, 2);
    assert!(population.is_empty());

    let stats = frame_loop.run(&mut engine, 10).unwrap();
    assert_eq!(stats.dispatches, 0);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.instances, 0);
}

#[test]
fn test_press_scatters_and_release_settles() {
    let mask = Mask::filled(100, 40, 255);
    let (mut engine, mut frame_loop, _) = engine_with(&mask, 2);

    let near = |engine: &HeadlessEngine| {
        engine
            .particles()
            .iter()
            .filter(|r| r.anchor.home.length() < 0.2)
            .map(|r| r.displacement())
            .fold(0.0, f32::max)
    };
    let far = |engine: &HeadlessEngine| {
        engine
            .particles()
            .iter()
            .filter(|r| r.anchor.home.length() > 0.8)
            .map(|r| r.displacement())
            .fold(0.0, f32::max)
    };

    engine.update_pointer(0.0, 0.0, true);
    frame_loop.run(&mut engine, 60).unwrap();
    assert!(near(&engine) > 0.1);
    // Outside the pointer radius only the ambient wobble acts
    assert!(far(&engine) < 0.01);

    engine.update_pointer(0.0, 0.0, false);
    frame_loop.run(&mut engine, SETTLE_FRAMES).unwrap();
    assert!(near(&engine) < 0.01, "not settled after {} frames", SETTLE_FRAMES);
}

#[test]
fn test_stats_count_workgroups() {
    let mask = Mask::filled(100, 40, 255);
    let (mut engine, mut frame_loop, _) = engine_with(&mask, 2);
    let stats = frame_loop.frame(&mut engine).unwrap();
    assert_eq!(stats.dispatches, 1);
    assert_eq!(stats.workgroups, 4);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.instances, 1000);
}

#[test]
fn test_packed_with_remainder_is_rejected() {
    let mask = Mask::filled(10, 10, 255);
    let (mut engine, _, population) = engine_with(&mask, 2);
    let before = engine.snapshot();

    for extra in 1..FLOATS_PER_PARTICLE {
        let mut packed = population.to_packed();
        packed.extend(std::iter::repeat(0.0).take(extra));
        let err = engine.set_packed(&packed).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParticleBuffer { len } if len == packed.len()));
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.particle_count() as usize, population.len());
    }
}

#[test]
fn test_packed_upload_matches_population() {
    let mask = Mask::filled(20, 20, 255);
    let population = SamplerConfig::new().with_stride(4).sample(&mask).unwrap();
    let mut engine = HeadlessEngine::default();
    engine.set_packed(&population.to_packed()).unwrap();
    assert_eq!(engine.snapshot(), population);
}

#[test]
fn test_set_particles_is_idempotent() {
    let mask = Mask::filled(30, 30, 255);
    let (mut engine, mut frame_loop, population) = engine_with(&mask, 3);
    engine.update_pointer(0.0, 0.0, true);
    frame_loop.run(&mut engine, 5).unwrap();

    engine.set_particles(&population).unwrap();
    let first = engine.snapshot();
    engine.set_particles(&population).unwrap();
    assert_eq!(engine.snapshot(), first);
    assert_eq!(first, population);
}

#[test]
fn test_population_shrinks_with_stride_on_full_mask() {
    let mask = Mask::filled(97, 61, 255);
    let mut previous = usize::MAX;
    for stride in 1..=12 {
        let n = SamplerConfig::new()
            .with_stride(stride)
            .sample(&mask)
            .unwrap()
            .len();
        assert!(n <= previous, "stride {} gave {} > {}", stride, n, previous);
        previous = n;
    }
}

#[test]
fn test_coarser_multiple_stride_is_subset() {
    // Irregular blob so the lattice hits and misses vary per stride
    let mask = Mask::from_alpha_fn(80, 50, |x, y| {
        let dx = x as f32 - 35.0;
        let dy = y as f32 - 22.0;
        if dx * dx / 900.0 + dy * dy / 300.0 < 1.0 || (x + 2 * y) % 7 == 0 {
            200
        } else {
            0
        }
    });
    for stride in 1..=4 {
        let fine = homes(&SamplerConfig::new().with_stride(stride).sample(&mask).unwrap());
        for k in 2..=3 {
            let coarse = homes(
                &SamplerConfig::new()
                    .with_stride(stride * k)
                    .sample(&mask)
                    .unwrap(),
            );
            assert!(coarse.is_subset(&fine), "stride {} vs {}", stride * k, stride);
        }
    }
}

#[test]
fn test_outline_population_plays_through_engine() {
    let mask = Mask::from_alpha_fn(120, 60, |x, y| {
        if (30..90).contains(&x) && (20..40).contains(&y) {
            255
        } else {
            0
        }
    });
    let population = SamplerConfig::new()
        .with_stride(3)
        .with_mode(SampleMode::Outline(OutlineConfig::default()))
        .sample(&mask)
        .unwrap();
    assert!(!population.is_empty());

    let mut engine = HeadlessEngine::default();
    engine.set_particles(&population).unwrap();
    let mut frame_loop = FrameLoop::with_clock(FrameClock::fixed(DT));
    frame_loop.start(&mut engine);
    frame_loop.run(&mut engine, 120).unwrap();
    assert!(engine.max_displacement() < 0.01);
}
