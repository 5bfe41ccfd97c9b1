//! Contour sampling.
//!
//! Instead of filling the glyphs, outline mode places particles on two rings
//! that follow the glyph boundary: a thick line hugging the edge and a thinner
//! halo a few pixels outside it. Points are scattered over the rings, then
//! relaxed apart so they spread evenly along the contour.
//!
//! ```text
//! inside  = alpha > threshold
//! edge    = inside pixels touching an outside pixel (8-neighbourhood)
//! ring 1  = dilate(edge, inner_thickness)
//! ring 2  = dilate(inside, gap + outer_thickness) - dilate(inside, gap)
//! target  = ring 1 | ring 2
//! ```

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::mask::Mask;
use crate::particle::{ParticleRecord, Population};
use crate::sampler::to_simulation_space;

/// Parameters for [`SampleMode::Outline`](crate::SampleMode::Outline).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineConfig {
    /// Half-thickness in pixels of the ring drawn on the glyph edge.
    pub inner_thickness: i32,
    /// Empty space in pixels between the glyph and the outer halo.
    pub gap: i32,
    /// Thickness in pixels of the outer halo.
    pub outer_thickness: i32,
    /// Candidate points spawned per kept ring pixel.
    pub candidates_per_pixel: usize,
    /// Number of repulsion passes.
    pub relax_iterations: u32,
    /// Fraction of the accumulated push applied per pass.
    pub relax_strength: f32,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            inner_thickness: 2,
            gap: 3,
            outer_thickness: 2,
            candidates_per_pixel: 4,
            relax_iterations: 7,
            relax_strength: 0.35,
        }
    }
}

impl OutlineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rings(mut self, inner_thickness: i32, gap: i32, outer_thickness: i32) -> Self {
        self.inner_thickness = inner_thickness;
        self.gap = gap;
        self.outer_thickness = outer_thickness;
        self
    }

    pub fn with_relaxation(mut self, iterations: u32, strength: f32) -> Self {
        self.relax_iterations = iterations;
        self.relax_strength = strength;
        self
    }
}

/// A binary image with the same dimensions as the source mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BitMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    /// Pixels whose alpha is strictly above `threshold`.
    pub fn from_alpha(mask: &Mask, threshold: u8) -> Self {
        let bits = mask
            .as_rgba()
            .chunks_exact(4)
            .map(|px| px[3] > threshold)
            .collect();
        Self {
            width: mask.width() as usize,
            height: mask.height() as usize,
            bits,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.width + x] = true;
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Set pixels that have at least one unset 8-neighbour.
    ///
    /// The outermost row and column are never reported.
    pub fn edges(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 1..self.height.saturating_sub(1) {
            for x in 1..self.width.saturating_sub(1) {
                if !self.get(x, y) {
                    continue;
                }
                let touches_outside = (y - 1..=y + 1)
                    .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                    .any(|(nx, ny)| !self.get(nx, ny));
                if touches_outside {
                    out.set(x, y);
                }
            }
        }
        out
    }

    /// Grow every set pixel into a `(2r+1)`-wide square.
    pub fn dilate(&self, radius: i32) -> Self {
        if radius <= 0 {
            return self.clone();
        }
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) {
                    continue;
                }
                let (x0, x1) = span(x, radius, self.width);
                let (y0, y1) = span(y, radius, self.height);
                for ny in y0..=y1 {
                    for nx in x0..=x1 {
                        out.set(nx, ny);
                    }
                }
            }
        }
        out
    }

    pub fn union(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a || b)
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a && !b)
    }

    fn zip_with(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        Self {
            width: self.width,
            height: self.height,
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        }
    }

    /// Centre of the closest set pixel within a square window of `radius`
    /// pixels around `point`.
    pub fn nearest(&self, point: Vec2, radius: i32) -> Option<Vec2> {
        let cx = point.x.round() as i32;
        let cy = point.y.round() as i32;
        let r = radius.max(1);

        let mut best: Option<(f32, Vec2)> = None;
        for y in (cy - r).max(0)..=(cy + r).min(self.height as i32 - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(self.width as i32 - 1) {
                if !self.get(x as usize, y as usize) {
                    continue;
                }
                let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d2 = centre.distance_squared(point);
                if best.is_none_or(|(best_d2, _)| d2 < best_d2) {
                    best = Some((d2, centre));
                }
            }
        }
        best.map(|(_, centre)| centre)
    }
}

fn span(center: usize, radius: i32, len: usize) -> (usize, usize) {
    let r = radius as usize;
    (center.saturating_sub(r), (center + r).min(len - 1))
}

/// The double-ring target for `inside`.
pub fn contour_rings(inside: &BitMask, config: &OutlineConfig) -> BitMask {
    let ring = inside.edges().dilate(config.inner_thickness);
    let near = inside.dilate(config.gap);
    let far = inside.dilate(config.gap + config.outer_thickness);
    ring.union(&far.difference(&near))
}

pub(crate) fn sample_outline(
    mask: &Mask,
    stride: u32,
    threshold: u8,
    config: &OutlineConfig,
    rng: &mut SmallRng,
) -> Population {
    let inside = BitMask::from_alpha(mask, threshold);
    let target = contour_rings(&inside, config);

    // Search radii are derived from the stride; past the mask extent they stop mattering
    let stride = stride.clamp(1, mask.width().max(mask.height()).max(1));
    let step = stride as f32;
    let keep_probability = 1.0 / (step * step);
    let spawn_snap = stride.max(4) as i32 * 2;
    let (lo, hi) = bounds(mask);

    let mut points = Vec::new();
    for y in 0..target.height {
        for x in 0..target.width {
            if !target.get(x, y) || rng.gen::<f32>() > keep_probability {
                continue;
            }
            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            for _ in 0..config.candidates_per_pixel {
                let jitter = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * (step * 0.9);
                let p = (centre + jitter).clamp(lo, hi);
                points.push(target.nearest(p, spawn_snap).unwrap_or(p));
            }
        }
    }

    let relax = Relaxation {
        radius: (step * 1.25 + 2.0).max(2.0),
        iterations: config.relax_iterations,
        strength: config.relax_strength,
        snap_radius: stride.max(2) as i32 * 3 + 5,
    };
    relax.apply(&mut points, &target, lo, hi);

    points
        .into_iter()
        .map(|p| {
            let home = to_simulation_space(p.x, p.y, mask.width(), mask.height());
            ParticleRecord::new(home, rng.gen(), 1.0)
        })
        .collect()
}

fn bounds(mask: &Mask) -> (Vec2, Vec2) {
    (
        Vec2::splat(0.5),
        Vec2::new(mask.width() as f32 - 0.5, mask.height() as f32 - 0.5),
    )
}

/// Short-range repulsion between points, re-projected onto the target after
/// every pass.
struct Relaxation {
    radius: f32,
    iterations: u32,
    strength: f32,
    snap_radius: i32,
}

impl Relaxation {
    fn apply(&self, points: &mut [Vec2], target: &BitMask, lo: Vec2, hi: Vec2) {
        if points.is_empty() {
            return;
        }

        let cell = self.radius.max(1.0);
        let cols = ((target.width as f32 / cell).ceil() as usize).max(1);
        let rows = ((target.height as f32 / cell).ceil() as usize).max(1);
        let cell_of = |p: Vec2| -> (i32, i32) {
            (
                ((p.x / cell).floor() as i32).clamp(0, cols as i32 - 1),
                ((p.y / cell).floor() as i32).clamp(0, rows as i32 - 1),
            )
        };

        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); cols * rows];
        let mut push = vec![Vec2::ZERO; points.len()];
        let r2 = cell * cell;

        for _ in 0..self.iterations {
            buckets.iter_mut().for_each(Vec::clear);
            for (i, &p) in points.iter().enumerate() {
                let (cx, cy) = cell_of(p);
                buckets[cy as usize * cols + cx as usize].push(i);
            }

            push.fill(Vec2::ZERO);
            for (i, &p) in points.iter().enumerate() {
                let (cx, cy) = cell_of(p);
                for ny in (cy - 1).max(0)..=(cy + 1).min(rows as i32 - 1) {
                    for nx in (cx - 1).max(0)..=(cx + 1).min(cols as i32 - 1) {
                        for &j in &buckets[ny as usize * cols + nx as usize] {
                            if j == i {
                                continue;
                            }
                            let away = p - points[j];
                            let d2 = away.length_squared();
                            if d2 <= 1e-6 || d2 >= r2 {
                                continue;
                            }
                            let d = d2.sqrt();
                            push[i] += away / d * ((cell - d) / cell);
                        }
                    }
                }
            }

            for (p, delta) in points.iter_mut().zip(&push) {
                let moved = (*p + *delta * self.strength).clamp(lo, hi);
                *p = target.nearest(moved, self.snap_radius).unwrap_or(moved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn square_mask(size: u32, lo: u32, hi: u32) -> Mask {
        Mask::from_alpha_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                255
            } else {
                0
            }
        })
    }

    #[test]
    fn test_edges_of_square() {
        let inside = BitMask::from_alpha(&square_mask(10, 2, 8), 10);
        let edges = inside.edges();
        // 6x6 square has a 1px boundary of 20 pixels
        assert_eq!(edges.count(), 20);
        assert!(edges.get(2, 2));
        assert!(!edges.get(4, 4));
    }

    #[test]
    fn test_edges_skip_border() {
        let full = BitMask::from_alpha(&Mask::filled(5, 5, 255), 10);
        assert_eq!(full.edges().count(), 0);
    }

    #[test]
    fn test_dilate_clamps_to_bounds() {
        let mut bits = BitMask::new(5, 5);
        bits.set(0, 0);
        let grown = bits.dilate(1);
        assert_eq!(grown.count(), 4);
        assert_eq!(bits.dilate(0), bits);
    }

    #[test]
    fn test_nearest_picks_closest_centre() {
        let mut bits = BitMask::new(10, 10);
        bits.set(2, 2);
        bits.set(7, 7);
        assert_eq!(bits.nearest(Vec2::new(6.0, 6.0), 3), Some(Vec2::new(7.5, 7.5)));
        assert_eq!(bits.nearest(Vec2::new(2.0, 2.0), 1), Some(Vec2::new(2.5, 2.5)));
        assert_eq!(BitMask::new(4, 4).nearest(Vec2::new(1.0, 1.0), 2), None);
    }

    #[test]
    fn test_rings_leave_gap_and_core_empty() {
        let inside = BitMask::from_alpha(&square_mask(40, 12, 28), 10);
        let rings = contour_rings(&inside, &OutlineConfig::default());
        // Edge ring
        assert!(rings.get(12, 20));
        // Deep inside the glyph
        assert!(!rings.get(20, 20));
        // Gap: 2px outside the glyph (ring 1 reaches 2px, gap ends at 3px)
        assert!(!rings.get(20, 12 - 3));
        // Halo: 4px outside
        assert!(rings.get(20, 12 - 4));
    }

    #[test]
    fn test_outline_particles_follow_contour() {
        let mask = square_mask(48, 16, 32);
        let mut rng = SmallRng::seed_from_u64(7);
        let population = sample_outline(&mask, 2, 10, &OutlineConfig::default(), &mut rng);
        assert!(!population.is_empty());

        // Nothing in the middle of the filled square
        for record in &population {
            let home = record.anchor.home;
            assert!(home.length() > 0.1, "particle at {home:?} inside the glyph core");
            assert_eq!(record.anchor.intensity, 1.0);
            assert_eq!(record.dynamics.position, home);
        }
    }

    #[test]
    fn test_outline_transparent_mask_is_empty() {
        let mask = Mask::filled(32, 32, 0);
        let mut rng = SmallRng::seed_from_u64(1);
        let population = sample_outline(&mask, 1, 10, &OutlineConfig::default(), &mut rng);
        assert!(population.is_empty());
    }

    #[test]
    fn test_outline_huge_stride_does_not_overflow() {
        let mask = Mask::filled(16, 16, 255);
        let mut rng = SmallRng::seed_from_u64(5);
        let huge = sample_outline(&mask, 1 << 30, 10, &OutlineConfig::default(), &mut rng);
        let mut rng = SmallRng::seed_from_u64(5);
        let widest = sample_outline(&mask, 16, 10, &OutlineConfig::default(), &mut rng);
        assert_eq!(huge, widest);

        let mut rng = SmallRng::seed_from_u64(5);
        sample_outline(&mask, u32::MAX, 10, &OutlineConfig::default(), &mut rng);
    }

    #[test]
    fn test_outline_is_reproducible() {
        let mask = square_mask(32, 8, 24);
        let run = || {
            let mut rng = SmallRng::seed_from_u64(99);
            sample_outline(&mask, 3, 10, &OutlineConfig::default(), &mut rng)
        };
        assert_eq!(run(), run());
    }
}
