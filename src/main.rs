use std::io::{self, BufWriter, Write};
use std::time::Instant;

mod config;
mod cpu;
mod framebuffer;
mod gpu;
mod math;
mod ppm;
mod scene;
mod trace;

use config::{RenderConfig, RenderMode};
use gpu::GpuRenderer;
use scene::Scene;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let render_config = RenderConfig::default();
    config::validate_config(&render_config)?;

    let scene = Scene::stacked(render_config.sphere_count);

    let started = Instant::now();
    let framebuffer = match config::RENDER_MODE {
        RenderMode::Sequential => cpu::render_sequential(&scene, &render_config),
        RenderMode::Threads => cpu::render_threads(&scene, &render_config),
        RenderMode::Gpu => {
            let mut renderer = pollster::block_on(GpuRenderer::new())
                .map_err(|error| format!("GPU initialization failed: {error}"))?;
            renderer
                .render(&scene, &render_config)
                .map_err(|error| format!("GPU render failed: {error}"))?
        }
    };
    log::info!(
        "rendered {}x{} with {} spheres [{}] in {} ms",
        render_config.width,
        render_config.height,
        render_config.sphere_count,
        config::RENDER_MODE.as_str(),
        started.elapsed().as_millis()
    );

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    ppm::write_ppm(&mut writer, &framebuffer)?;
    writer.flush()?;

    Ok(())
}
