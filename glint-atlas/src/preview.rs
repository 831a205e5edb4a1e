use std::{fs::File, io::BufWriter, path::Path};

use color_eyre::eyre::{Context, Result};
use glint_data::FontAtlasData;

/// Writes the atlas coverage texture as an 8-bit grayscale PNG.
pub fn write_png(atlas: &FontAtlasData, path: &Path) -> Result<()> {
    let (width, height) = atlas.texture_size;
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create preview file '{}'", path.display()))?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&atlas.texture_data)?;
    writer.finish()?;

    tracing::debug!(path = %path.display(), width, height, "wrote atlas preview");
    Ok(())
}
