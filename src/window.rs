use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use textboom::{
    EngineConfig, EngineError, FrameLoop, GpuEngine, Mask, OutlineConfig, ParticleEngine,
    SampleMode, SamplerConfig,
};

const MAX_STRIDE: u32 = 16;
const TITLE_INTERVAL: Duration = Duration::from_millis(500);

pub struct App {
    mask: Mask,
    sampler: SamplerConfig,
    engine_config: EngineConfig,
    window: Option<Arc<Window>>,
    engine: Option<GpuEngine>,
    frame_loop: FrameLoop,
    last_title: Instant,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(mask: Mask, sampler: SamplerConfig, engine_config: EngineConfig) -> Self {
        Self {
            mask,
            sampler,
            engine_config,
            window: None,
            engine: None,
            frame_loop: FrameLoop::new(),
            last_title: Instant::now(),
            failure: None,
        }
    }

    /// The error that ended the event loop, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        if let Some(engine) = &mut self.engine {
            engine.destroy();
        }
        self.failure = Some(err);
        event_loop.exit();
    }

    fn resubmit(&mut self) -> anyhow::Result<()> {
        let Some(engine) = &mut self.engine else {
            return Ok(());
        };
        let population = self.sampler.sample(&self.mask)?;
        engine.set_particles(&population)?;
        log::info!(
            "{} particles (stride {}, {})",
            population.len(),
            self.sampler.stride,
            match self.sampler.mode {
                SampleMode::Grid => "grid",
                SampleMode::Outline(_) => "outline",
            }
        );
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        let changed = match key {
            Key::Named(NamedKey::Escape) => {
                event_loop.exit();
                return;
            }
            Key::Named(NamedKey::Space) => true,
            Key::Character(c) => match c.as_str() {
                "+" | "=" => {
                    self.sampler.stride = self.sampler.stride.saturating_sub(1).max(1);
                    true
                }
                "-" | "_" => {
                    self.sampler.stride = (self.sampler.stride + 1).min(MAX_STRIDE);
                    true
                }
                "o" | "O" => {
                    self.sampler.mode = match self.sampler.mode {
                        SampleMode::Grid => SampleMode::Outline(OutlineConfig::default()),
                        SampleMode::Outline(_) => SampleMode::Grid,
                    };
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if changed {
            if let Err(err) = self.resubmit() {
                self.fail(event_loop, err);
            }
        }
    }

    fn update_title(&mut self) {
        if self.last_title.elapsed() < TITLE_INTERVAL {
            return;
        }
        self.last_title = Instant::now();
        if let (Some(window), Some(engine)) = (&self.window, &self.engine) {
            window.set_title(&format!(
                "textboom - {} particles - {:.0} fps",
                engine.particle_count(),
                self.frame_loop.clock().fps()
            ));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("textboom")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 480));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                return self.fail(event_loop, anyhow::anyhow!("failed to create window: {}", err))
            }
        };
        self.window = Some(window.clone());

        match GpuEngine::initialize(window.clone(), self.engine_config) {
            Ok(engine) => self.engine = Some(engine),
            Err(err) => return self.fail(event_loop, err.into()),
        }
        if let Err(err) = self.resubmit() {
            return self.fail(event_loop, err);
        }
        if let Some(engine) = &mut self.engine {
            self.frame_loop.start(engine);
        }
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(engine) = &mut self.engine {
            engine.handle_window_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(engine) = &mut self.engine {
                    engine.destroy();
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, &logical_key),
            WindowEvent::RedrawRequested => {
                let Some(engine) = &mut self.engine else {
                    return;
                };
                match self.frame_loop.frame(engine) {
                    Ok(_) => {}
                    Err(err @ EngineError::Surface(_)) => return self.fail(event_loop, err.into()),
                    Err(err) => log::error!("frame failed: {}", err),
                }
                self.update_title();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
