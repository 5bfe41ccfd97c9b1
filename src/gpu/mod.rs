//! wgpu backend: compute update plus instanced sprite render, one submit per
//! frame.

mod pipelines;
mod resources;

use std::sync::Arc;

use winit::event::WindowEvent;
use winit::window::Window;

use crate::display::DisplayTarget;
use crate::engine::{EngineConfig, EngineState, FrameStats, ParticleEngine};
use crate::error::EngineError;
use crate::input::PointerInput;
use crate::particle::Population;
use crate::shader::workgroup_count;
use crate::uniforms::RenderUniforms;

use pipelines::{BindGroups, Pipelines};
use resources::{check_limits, FrameBuffers, ParticleBuffers};

pub use resources::{storage_size, QuadVertex, QUAD_VERTICES};

/// Everything tied to the device. Dropped as a unit on destroy.
struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: Pipelines,
    frame: FrameBuffers,
    particles: Option<ParticleBuffers>,
    bind_groups: Option<BindGroups>,
}

/// [`ParticleEngine`] rendering into a winit window.
pub struct GpuEngine {
    window: Arc<Window>,
    context: Option<GpuContext>,
    state: EngineState,
    input: PointerInput,
    clear_color: wgpu::Color,
}

impl GpuEngine {
    /// Blocking wrapper around [`GpuEngine::new`].
    pub fn initialize(window: Arc<Window>, config: EngineConfig) -> Result<Self, EngineError> {
        pollster::block_on(Self::new(window, config))
    }

    /// Acquire an adapter and device, configure the window surface and build
    /// both pipelines. The engine starts with an empty population and is not
    /// running.
    ///
    /// No particle buffers exist until the first
    /// [`set_particles`](ParticleEngine::set_particles); an empty engine has
    /// no bind groups, so ticks draw nothing until then.
    pub async fn new(window: Arc<Window>, config: EngineConfig) -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| EngineError::SurfaceConfiguration(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| {
                EngineError::SurfaceConfiguration("surface reports no supported formats".into())
            })?;
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let (width, height) = window.backing_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        surface.configure(&device, &surface_config);
        if let Some(err) = device.pop_error_scope().await {
            return Err(EngineError::SurfaceConfiguration(err.to_string()));
        }
        log::debug!("surface configured {}x{} {:?} {:?}", width, height, format, alpha_mode);

        let pipelines = Pipelines::new(&device, format);
        let frame = FrameBuffers::new(&device);

        let mut input = PointerInput::new();
        input.set_window_size(width, height);

        Ok(Self {
            window,
            context: Some(GpuContext {
                surface,
                device,
                queue,
                config: surface_config,
                pipelines,
                frame,
                particles: None,
                bind_groups: None,
            }),
            state: EngineState::new(&config),
            input,
            clear_color: config.clear_color,
        })
    }

    /// Route a window event to the pointer tracker.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let Some(pointer) = self.input.handle_event(event) {
            self.state
                .update_pointer(pointer.ndc.x, pointer.ndc.y, pointer.pressed);
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Current surface size in physical pixels, `None` once destroyed.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.context
            .as_ref()
            .map(|ctx| (ctx.config.width, ctx.config.height))
    }
}

impl ParticleEngine for GpuEngine {
    fn state(&self) -> &EngineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    fn set_particles(&mut self, population: &Population) -> Result<(), EngineError> {
        let Some(ctx) = self.context.as_mut() else {
            log::warn!("set_particles on a destroyed engine ignored");
            return Ok(());
        };

        // Old buffers go first; a failed allocation leaves an empty engine
        ctx.bind_groups = None;
        ctx.particles = None;
        self.state.set_particle_count(0);

        let bytes = check_limits(population.len(), &ctx.device.limits())?;

        // Scopes pop in reverse push order
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let particles = ParticleBuffers::upload(&ctx.device, &ctx.queue, population);
        let bind_groups = ctx.pipelines.bind(&ctx.device, &particles, &ctx.frame);
        let out_of_memory = pollster::block_on(ctx.device.pop_error_scope());
        let invalid = pollster::block_on(ctx.device.pop_error_scope());
        if let Some(err) = out_of_memory.or(invalid) {
            return Err(EngineError::BufferAllocation {
                count: population.len(),
                reason: err.to_string(),
            });
        }

        ctx.bind_groups = Some(bind_groups);
        ctx.particles = Some(particles);
        self.state.set_particle_count(population.len());
        log::debug!(
            "uploaded {} particles ({} bytes per half)",
            ctx.particles.as_ref().map_or(0, |p| p.count),
            bytes
        );
        Ok(())
    }

    fn tick(&mut self, delta_time: f32) -> Result<FrameStats, EngineError> {
        let Self {
            context,
            state,
            clear_color,
            ..
        } = self;
        let Some(ctx) = context.as_mut() else {
            return Ok(FrameStats::idle());
        };
        if !state.should_tick() {
            return Ok(FrameStats::idle());
        }

        let sim = state.advance(delta_time);
        let count = state.particle_count();
        let Some(bind_groups) = ctx.bind_groups.as_ref() else {
            return Ok(FrameStats::idle());
        };
        if count == 0 {
            return Ok(FrameStats::idle());
        }

        let render = RenderUniforms::new(
            ctx.config.width,
            ctx.config.height,
            state.particle_size(),
            sim.time,
        );
        ctx.queue
            .write_buffer(ctx.frame.sim_uniforms.raw(), 0, bytemuck::bytes_of(&sim));
        ctx.queue
            .write_buffer(ctx.frame.render_uniforms.raw(), 0, bytemuck::bytes_of(&render));

        let output = match ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                ctx.surface.configure(&ctx.device, &ctx.config);
                return Ok(FrameStats::idle());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(FrameStats::idle());
            }
            Err(err) => return Err(err.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&ctx.pipelines.compute);
            compute_pass.set_bind_group(0, &bind_groups.compute, &[]);
            compute_pass.dispatch_workgroups(workgroup_count(count), 1, 1);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(*clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&ctx.pipelines.render);
            render_pass.set_bind_group(0, &bind_groups.render, &[]);
            render_pass.set_vertex_buffer(0, ctx.frame.quad.raw().slice(..));
            render_pass.draw(0..6, 0..count);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(FrameStats::for_population(count))
    }

    fn resize_surface_if_needed(&mut self) -> bool {
        let Some(ctx) = self.context.as_mut() else {
            return false;
        };
        let (width, height) = self.window.backing_size();
        if width == ctx.config.width && height == ctx.config.height {
            return false;
        }
        ctx.config.width = width;
        ctx.config.height = height;
        ctx.surface.configure(&ctx.device, &ctx.config);
        self.input.set_window_size(width, height);
        log::debug!("surface resized to {}x{}", width, height);
        true
    }

    fn destroy(&mut self) {
        if !self.state.kill() {
            return;
        }
        self.input.detach();
        // Dropping the context destroys every buffer it owns
        self.context = None;
        log::info!("engine destroyed");
    }
}

impl Drop for GpuEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}
