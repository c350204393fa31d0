use rayon::prelude::*;

use crate::config::RenderConfig;
use crate::framebuffer::Framebuffer;
use crate::math::Vec3;
use crate::scene::Scene;
use crate::trace;

/// Reference strategy: one thread, rows from the top of the image down,
/// columns left to right. Every other strategy is compared against the bytes
/// this one produces.
pub fn render_sequential(scene: &Scene, config: &RenderConfig) -> Framebuffer {
    let mut framebuffer = Framebuffer::new(config.width, config.height);
    for y in (0..config.height).rev() {
        for x in 0..config.width {
            let color = trace::pixel_color(scene, x, y, config.width, config.height);
            framebuffer.set(x, y, color);
        }
    }
    framebuffer
}

/// Scanline-parallel strategy: the pixel grid is split by rows across a
/// worker pool. Each row band is owned by exactly one worker, and pixels are
/// pure functions of the shared read-only scene, so no synchronization is
/// needed and the result is bit-identical to the sequential strategy.
pub fn render_threads(scene: &Scene, config: &RenderConfig) -> Framebuffer {
    let width = config.width as usize;
    let height = config.height as usize;
    let mut pixels = vec![Vec3::splat(0.0); width * height];

    pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, slot) in row.iter_mut().enumerate() {
                *slot = trace::pixel_color(
                    scene,
                    x as u32,
                    y as u32,
                    config.width,
                    config.height,
                );
            }
        });

    Framebuffer::from_pixels(config.width, config.height, pixels)
}
