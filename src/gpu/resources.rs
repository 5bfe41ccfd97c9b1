//! GPU buffers owned by the engine.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::error::EngineError;
use crate::particle::{Anchor, Dynamics, Population, HALF_RECORD_SIZE};
use crate::shader::workgroup_count;
use crate::uniforms::{RenderUniforms, SimUniforms};

/// Smallest storage buffer allocated, even for an empty population.
const MIN_STORAGE_SIZE: u64 = 16;

/// A buffer destroyed when dropped.
#[derive(Debug)]
pub struct OwnedBuffer(wgpu::Buffer);

impl OwnedBuffer {
    pub fn new(buffer: wgpu::Buffer) -> Self {
        Self(buffer)
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.0
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// One corner of the particle quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
    pub uv: [f32; 2],
}

/// Two triangles covering `[-0.5, 0.5]²`.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { corner: [-0.5, -0.5], uv: [0.0, 0.0] },
    QuadVertex { corner: [0.5, -0.5], uv: [1.0, 0.0] },
    QuadVertex { corner: [0.5, 0.5], uv: [1.0, 1.0] },
    QuadVertex { corner: [-0.5, -0.5], uv: [0.0, 0.0] },
    QuadVertex { corner: [0.5, 0.5], uv: [1.0, 1.0] },
    QuadVertex { corner: [-0.5, 0.5], uv: [0.0, 1.0] },
];

/// Byte size of one half buffer for `count` particles.
pub fn storage_size(count: usize) -> u64 {
    (count as u64 * HALF_RECORD_SIZE).max(MIN_STORAGE_SIZE)
}

/// Reject populations the device cannot hold before anything is allocated.
///
/// Returns the per-half buffer size on success.
pub fn check_limits(count: usize, limits: &wgpu::Limits) -> Result<u64, EngineError> {
    let size = storage_size(count);
    let max_binding = u64::from(limits.max_storage_buffer_binding_size);
    let reason = if size > limits.max_buffer_size {
        format!("{} bytes per half exceeds max_buffer_size {}", size, limits.max_buffer_size)
    } else if size > max_binding {
        format!(
            "{} bytes per half exceeds max_storage_buffer_binding_size {}",
            size, max_binding
        )
    } else if workgroup_count(u32::try_from(count).unwrap_or(u32::MAX)) > limits.max_compute_workgroups_per_dimension {
        format!(
            "{} workgroups exceeds max_compute_workgroups_per_dimension {}",
            workgroup_count(u32::try_from(count).unwrap_or(u32::MAX)),
            limits.max_compute_workgroups_per_dimension
        )
    } else {
        return Ok(size);
    };
    Err(EngineError::BufferAllocation { count, reason })
}

/// Storage buffers for both halves of the population.
#[derive(Debug)]
pub struct ParticleBuffers {
    pub anchors: OwnedBuffer,
    pub dynamics: OwnedBuffer,
    pub count: u32,
}

impl ParticleBuffers {
    /// Allocate buffers for `population` and upload it with dynamics at rest.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, population: &Population) -> Self {
        let size = storage_size(population.len());
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let anchors = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Anchor Buffer"),
            size,
            usage,
            mapped_at_creation: false,
        });
        let dynamics = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamics Buffer"),
            size,
            usage,
            mapped_at_creation: false,
        });

        if !population.is_empty() {
            let anchor_data: Vec<Anchor> = population.anchors();
            let dynamics_data: Vec<Dynamics> = population.rest_dynamics();
            queue.write_buffer(&anchors, 0, bytemuck::cast_slice(&anchor_data));
            queue.write_buffer(&dynamics, 0, bytemuck::cast_slice(&dynamics_data));
        }

        Self {
            anchors: OwnedBuffer::new(anchors),
            dynamics: OwnedBuffer::new(dynamics),
            count: u32::try_from(population.len()).unwrap_or(u32::MAX),
        }
    }
}

/// Static quad plus the two uniform blocks.
#[derive(Debug)]
pub struct FrameBuffers {
    pub quad: OwnedBuffer,
    pub sim_uniforms: OwnedBuffer,
    pub render_uniforms: OwnedBuffer,
}

impl FrameBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sim_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Uniform Buffer"),
            contents: bytemuck::bytes_of(&SimUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let render_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Uniform Buffer"),
            contents: bytemuck::bytes_of(&RenderUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            quad: OwnedBuffer::new(quad),
            sim_uniforms: OwnedBuffer::new(sim_uniforms),
            render_uniforms: OwnedBuffer::new(render_uniforms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_size() {
        assert_eq!(storage_size(0), 16);
        assert_eq!(storage_size(1), 16);
        assert_eq!(storage_size(1000), 16_000);
    }

    #[test]
    fn test_check_limits_accepts_default_sized_populations() {
        let limits = wgpu::Limits::default();
        assert_eq!(check_limits(0, &limits).unwrap(), 16);
        assert_eq!(check_limits(1_000_000, &limits).unwrap(), 16_000_000);
    }

    #[test]
    fn test_check_limits_rejects_oversized_binding() {
        let limits = wgpu::Limits::default();
        let max = u64::from(limits.max_storage_buffer_binding_size);
        let fits = (max / HALF_RECORD_SIZE) as usize;
        assert!(check_limits(fits, &limits).is_ok());

        // One particle past a 4096x2048 mask at stride 1
        match check_limits(fits + 1, &limits) {
            Err(EngineError::BufferAllocation { count, reason }) => {
                assert_eq!(count, fits + 1);
                assert!(reason.contains("max_storage_buffer_binding_size"));
            }
            other => panic!("expected BufferAllocation, got {other:?}"),
        }
    }

    #[test]
    fn test_check_limits_rejects_oversized_buffer() {
        let limits = wgpu::Limits {
            max_buffer_size: 1024,
            ..wgpu::Limits::default()
        };
        match check_limits(65, &limits) {
            Err(EngineError::BufferAllocation { reason, .. }) => {
                assert!(reason.contains("max_buffer_size"));
            }
            other => panic!("expected BufferAllocation, got {other:?}"),
        }
    }

    #[test]
    fn test_check_limits_rejects_too_many_workgroups() {
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 2,
            ..wgpu::Limits::default()
        };
        assert!(check_limits(512, &limits).is_ok());
        assert!(check_limits(513, &limits).is_err());
    }

    #[test]
    fn test_quad_covers_unit_square() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        for v in QUAD_VERTICES {
            assert_eq!(v.corner[0].abs(), 0.5);
            assert_eq!(v.corner[1].abs(), 0.5);
            assert_eq!(v.uv[0], v.corner[0] + 0.5);
            assert_eq!(v.uv[1], v.corner[1] + 0.5);
        }
    }
}
