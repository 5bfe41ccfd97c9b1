mod banner;
mod window;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use textboom::{EngineConfig, Mask, OutlineConfig, SampleMode, SamplerConfig};

/// Render text as an interactive particle field.
///
/// Press and drag to scatter particles. `+`/`-` change density, `O` toggles
/// outline sampling, Space resets the field, Escape quits.
#[derive(Parser, Debug)]
#[command(name = "textboom", version, about)]
struct Cli {
    /// PNG mask whose alpha channel selects particle locations
    #[arg(long, value_name = "PNG", conflicts_with = "text")]
    mask: Option<PathBuf>,

    /// Text to render with the built-in block font
    #[arg(long, default_value = "TEXTBOOM")]
    text: String,

    /// Pixel size of one font dot when rendering --text
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    cell: u32,

    /// Distance in pixels between sampled points
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    stride: u32,

    /// Minimum alpha (0-255) for a pixel to spawn a particle
    #[arg(long, default_value_t = 10)]
    alpha_threshold: u8,

    /// Particle sprite size in physical pixels
    #[arg(long, default_value_t = 3.0)]
    particle_size: f32,

    /// Sample the glyph outline instead of filling it
    #[arg(long)]
    outline: bool,

    /// Increase log verbosity (-v debug, -vv everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn,textboom=info",
        1 => "warn,textboom=debug",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mask = match &cli.mask {
        Some(path) => Mask::from_file(path)
            .with_context(|| format!("failed to load mask {}", path.display()))?,
        None => banner::render(&cli.text, cli.cell),
    };
    log::info!("mask {}x{}", mask.width(), mask.height());

    let mode = if cli.outline {
        SampleMode::Outline(OutlineConfig::default())
    } else {
        SampleMode::Grid
    };
    let sampler = SamplerConfig::new()
        .with_stride(cli.stride)
        .with_alpha_threshold(cli.alpha_threshold)
        .with_mode(mode);
    let engine_config = EngineConfig::new().with_particle_size(cli.particle_size);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = window::App::new(mask, sampler, engine_config);
    event_loop.run_app(&mut app).context("event loop failed")?;
    app.finish()
}
