//! PNG export with embedded view metadata (tEXt chunks).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use dsbrot_core::{KernelOptions, Lane, Resolution, ViewportParams};
use tracing::debug;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;
use crate::palette::ColorPolicy;

/// View parameters written next to the pixels so a frame can be reproduced.
///
/// Extended-precision values are stored as both the leading/trailing lane
/// pair and their `f64` sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub arithmetic: &'static str,
    pub center_re: String,
    pub center_im: String,
    pub scale: String,
    pub max_iterations: f32,
    pub budget: u32,
    pub multiply: &'static str,
    pub bailout: &'static str,
    pub snap: &'static str,
    pub coloring: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    pub fn from_frame<L: Lane>(
        params: &ViewportParams<L>,
        options: &KernelOptions,
        policy: &ColorPolicy,
        resolution: Resolution,
    ) -> Self {
        Self {
            arithmetic: L::NAME,
            center_re: format!("{} = {:e}", params.center.re, params.center.re.to_f64()),
            center_im: format!("{} = {:e}", params.center.im, params.center.im.to_f64()),
            scale: format!("{} = {:e}", params.scale, params.scale.to_f64()),
            max_iterations: params.max_iterations,
            budget: params.effective_iterations(),
            multiply: options.multiply.label(),
            bailout: options.bailout.label(),
            snap: options.snap.label(),
            coloring: policy.label(),
            width: resolution.width,
            height: resolution.height,
        }
    }

    fn description(&self) -> String {
        format!(
            "Mandelbrot ({}) - Center: {} {}i, Scale: {}, Iterations: {}",
            self.arithmetic, self.center_re, self.center_im, self.scale, self.budget,
        )
    }

    fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("dsbrot.Arithmetic".into(), self.arithmetic.into()),
            ("dsbrot.CenterRe".into(), self.center_re.clone()),
            ("dsbrot.CenterIm".into(), self.center_im.clone()),
            ("dsbrot.Scale".into(), self.scale.clone()),
            ("dsbrot.MaxIterations".into(), self.max_iterations.to_string()),
            ("dsbrot.Budget".into(), self.budget.to_string()),
            ("dsbrot.Multiply".into(), self.multiply.into()),
            ("dsbrot.Bailout".into(), self.bailout.into()),
            ("dsbrot.PixelSnap".into(), self.snap.into()),
            ("dsbrot.Coloring".into(), self.coloring.into()),
            (
                "dsbrot.Resolution".into(),
                format!("{}x{}", self.width, self.height),
            ),
        ]
    }
}

/// Write an RGBA buffer as a PNG file with the frame's metadata.
///
/// Uses the `png` crate directly so custom tEXt chunks can be injected.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let expected = buffer.width as usize * buffer.height as usize * 4;
    if buffer.pixels.len() != expected {
        return Err(RenderError::BufferSize {
            width: buffer.width,
            height: buffer.height,
            expected,
            actual: buffer.pixels.len(),
        });
    }

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "dsbrot".to_string())?;
    encoder.add_text_chunk("Description".to_string(), metadata.description())?;
    for (key, value) in metadata.pairs() {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.pixels)?;
    png_writer.finish()?;

    debug!(
        width = buffer.width,
        height = buffer.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}
