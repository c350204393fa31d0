use std::io::{self, Write};

use crate::framebuffer::{quantize_channel, Framebuffer};

/// Serializes the frame as an ASCII PPM (P3): header, then one `R G B` line
/// per pixel. Rows are written top-to-bottom, which walks internal y from
/// `height - 1` down to 0.
pub fn write_ppm<W: Write>(writer: &mut W, framebuffer: &Framebuffer) -> io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", framebuffer.width(), framebuffer.height())?;
    writeln!(writer, "255")?;

    for y in (0..framebuffer.height()).rev() {
        for x in 0..framebuffer.width() {
            let color = framebuffer.pixel(x, y);
            writeln!(
                writer,
                "{} {} {}",
                quantize_channel(color.x),
                quantize_channel(color.y),
                quantize_channel(color.z)
            )?;
        }
    }

    Ok(())
}
