//! Particle records and populations.
//!
//! A particle is eight `f32` scalars split into two halves that live in two
//! separate GPU storage buffers:
//!
//! | Half | Type | Fields | GPU access |
//! |------|------|--------|------------|
//! | A | [`Anchor`] | `home.xy`, `seed`, `intensity` | read-only everywhere |
//! | B | [`Dynamics`] | `position.xy`, `velocity.xy` | written by the compute pass |
//!
//! The packed wire form used between the sampler and the engine is the two
//! halves back to back: `[home.x, home.y, seed, intensity, pos.x, pos.y, vel.x, vel.y]`.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::error::EngineError;

/// Number of `f32` scalars in one packed particle record.
pub const FLOATS_PER_PARTICLE: usize = 8;

/// Size in bytes of one half of a particle record on the GPU.
pub const HALF_RECORD_SIZE: u64 = std::mem::size_of::<Anchor>() as u64;

/// Immutable home state of a particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Anchor {
    /// Position the particle springs back toward, in simulation space.
    pub home: Vec2,
    /// Per-particle random value in `[0, 1)`, used as noise phase and tint.
    pub seed: f32,
    /// Brightness weight in `[0, 1]`, taken from the source pixel's alpha.
    pub intensity: f32,
}

/// Live simulated state of a particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Dynamics {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Dynamics {
    /// At rest on the given anchor.
    #[inline]
    pub fn at_rest(anchor: &Anchor) -> Self {
        Self {
            position: anchor.home,
            velocity: Vec2::ZERO,
        }
    }
}

/// One complete particle: anchor half plus dynamic half.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParticleRecord {
    pub anchor: Anchor,
    pub dynamics: Dynamics,
}

impl ParticleRecord {
    /// Create a particle resting at `home`.
    pub fn new(home: Vec2, seed: f32, intensity: f32) -> Self {
        let anchor = Anchor {
            home,
            seed,
            intensity,
        };
        Self {
            anchor,
            dynamics: Dynamics::at_rest(&anchor),
        }
    }

    /// Distance between the live position and the home position.
    #[inline]
    pub fn displacement(&self) -> f32 {
        self.dynamics.position.distance(self.anchor.home)
    }

    fn write_packed(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(bytemuck::cast_slice(&[self.anchor]));
        out.extend_from_slice(bytemuck::cast_slice(&[self.dynamics]));
    }

    fn from_packed(chunk: &[f32]) -> Self {
        let anchor: Anchor = bytemuck::pod_read_unaligned(bytemuck::cast_slice(&chunk[0..4]));
        let dynamics: Dynamics = bytemuck::pod_read_unaligned(bytemuck::cast_slice(&chunk[4..8]));
        Self { anchor, dynamics }
    }
}

/// An ordered set of particles produced by one sampling pass.
///
/// Order follows the sampler's scan order and is stable for a given input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Population {
    records: Vec<ParticleRecord>,
}

impl Population {
    /// An empty population.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ParticleRecord>) -> Self {
        Self { records }
    }

    /// Decode a packed array of particle records.
    ///
    /// Fails with [`EngineError::InvalidParticleBuffer`] unless the length is a
    /// multiple of [`FLOATS_PER_PARTICLE`].
    pub fn from_packed(packed: &[f32]) -> Result<Self, EngineError> {
        if packed.len() % FLOATS_PER_PARTICLE != 0 {
            return Err(EngineError::InvalidParticleBuffer { len: packed.len() });
        }
        let records = packed
            .chunks_exact(FLOATS_PER_PARTICLE)
            .map(ParticleRecord::from_packed)
            .collect();
        Ok(Self { records })
    }

    /// Encode into the flat packed form.
    pub fn to_packed(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.records.len() * FLOATS_PER_PARTICLE);
        for record in &self.records {
            record.write_packed(&mut out);
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParticleRecord> {
        self.records.iter()
    }

    /// The anchor halves, ready for upload.
    pub fn anchors(&self) -> Vec<Anchor> {
        self.records.iter().map(|r| r.anchor).collect()
    }

    /// Dynamic halves reset to rest on each anchor.
    ///
    /// Whatever dynamics the population carries are ignored: every upload
    /// starts the particles at home with zero velocity.
    pub fn rest_dynamics(&self) -> Vec<Dynamics> {
        self.records
            .iter()
            .map(|r| Dynamics::at_rest(&r.anchor))
            .collect()
    }

    /// Records with their dynamics reset to rest.
    pub(crate) fn rest_records(&self) -> Vec<ParticleRecord> {
        self.records
            .iter()
            .map(|r| ParticleRecord {
                anchor: r.anchor,
                dynamics: Dynamics::at_rest(&r.anchor),
            })
            .collect()
    }
}

impl FromIterator<ParticleRecord> for Population {
    fn from_iter<I: IntoIterator<Item = ParticleRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a ParticleRecord;
    type IntoIter = std::slice::Iter<'a, ParticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_sizes() {
        assert_eq!(std::mem::size_of::<Anchor>(), 16);
        assert_eq!(std::mem::size_of::<Dynamics>(), 16);
        assert_eq!(HALF_RECORD_SIZE, 16);
    }

    #[test]
    fn test_packed_layout() {
        let mut record = ParticleRecord::new(Vec2::new(0.25, -0.5), 0.75, 0.5);
        record.dynamics.velocity = Vec2::new(1.0, 2.0);
        let packed = Population::from_records(vec![record]).to_packed();
        assert_eq!(packed, vec![0.25, -0.5, 0.75, 0.5, 0.25, -0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_from_packed_rejects_partial_record() {
        for len in [1, 7, 9, 15] {
            let packed = vec![0.0; len];
            let err = Population::from_packed(&packed).unwrap_err();
            assert!(matches!(err, EngineError::InvalidParticleBuffer { len: l } if l == len));
        }
    }

    #[test]
    fn test_from_packed_empty() {
        let population = Population::from_packed(&[]).unwrap();
        assert!(population.is_empty());
    }

    #[test]
    fn test_rest_dynamics_discards_motion() {
        let mut record = ParticleRecord::new(Vec2::new(0.1, 0.2), 0.0, 1.0);
        record.dynamics.position = Vec2::new(5.0, 5.0);
        record.dynamics.velocity = Vec2::new(-1.0, 3.0);
        let population = Population::from_records(vec![record]);

        let rest = population.rest_dynamics();
        assert_eq!(rest[0].position, Vec2::new(0.1, 0.2));
        assert_eq!(rest[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn test_displacement() {
        let mut record = ParticleRecord::new(Vec2::ZERO, 0.0, 1.0);
        assert_eq!(record.displacement(), 0.0);
        record.dynamics.position = Vec2::new(3.0, 4.0);
        assert!((record.displacement() - 5.0).abs() < 1e-6);
    }
}
