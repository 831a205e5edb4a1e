mod cli;
mod logging;
mod preview;

use std::{fs, path::Path};

use clap::Parser;
use color_eyre::eyre::{Context, Result, bail, eyre};
use glint_atlas::{AtlasGenerator, GenerationReport};
use glint_data::FontAtlasData;
use tracing::debug;

use crate::{
    cli::Cli,
    logging::{LoggingConfig, init_logging},
};

fn main() -> Result<()> {
    // panic hook
    color_eyre::install()?;

    // Initialize structured logging
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config).wrap_err("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "glint-atlas starting up"
    );

    // parse command line arguments
    let cli = Cli::parse();

    // handle --list-fonts flag
    if cli.list_fonts {
        Cli::display_font_list();
        return Ok(());
    }

    // validate CLI arguments
    cli.validate()?;

    let source = cli.font_source()?;
    let font = source
        .load()
        .wrap_err_with(|| format!("Failed to load font '{source}'"))?;
    let charset = cli.charset()?;

    let generator = AtlasGenerator::new(&font, cli.atlas_config())?;
    cli.print_summary(generator.font_name(), &charset);

    let (atlas, report) = generator.generate(&charset)?;

    let file_size = write_verified(&atlas, &cli.output)?;

    if let Some(png_path) = &cli.png {
        preview::write_png(&atlas, png_path)?;
        println!("Preview written to {}", png_path.display());
    }

    print_report(&report, file_size);

    Ok(())
}

/// Writes the atlas, then reads the file back and checks that it
/// deserializes into the same atlas. Returns the file size.
fn write_verified(atlas: &FontAtlasData, path: &Path) -> Result<usize> {
    let bytes = atlas.to_binary();
    fs::write(path, &bytes)
        .wrap_err_with(|| format!("Failed to write atlas '{}'", path.display()))?;

    let written = fs::read(path)
        .wrap_err_with(|| format!("Failed to read back atlas '{}'", path.display()))?;
    let reloaded = FontAtlasData::from_binary(&written).map_err(|e| {
        eyre!("Written atlas '{}' does not deserialize: {}", path.display(), e.message)
    })?;
    if reloaded != *atlas {
        bail!("Written atlas '{}' does not match the generated one", path.display());
    }

    debug!(path = %path.display(), bytes = written.len(), "verified written atlas");
    Ok(written.len())
}

fn print_report(report: &GenerationReport, file_size: usize) {
    println!("\nFont atlas generated!");
    println!("Font family: {}", report.font_name);
    println!("Texture size: {}x{}", report.texture_size.0, report.texture_size.1);
    println!("Glyph count: {}", report.glyph_count);
    println!("Kerning pairs: {}", report.kerning_pairs);
    println!("Texture fill: {:.1}%", report.fill_ratio * 100.0);
    println!("File size: {:.1} KiB", file_size as f32 / 1024.0);

    if report.missing.is_empty() {
        return;
    }

    println!("\n⚠️  {} characters have no glyph in this font:", report.missing.len());
    for chunk in report.missing.chunks(64) {
        let symbols: String = chunk.iter().collect();
        println!("  {symbols}");
    }
}

#[cfg(test)]
mod tests {
    use glint_data::{AtlasRect, GlyphEntry, LineMetrics};

    use super::*;

    fn atlas() -> FontAtlasData {
        let glyph = |symbol, x| GlyphEntry {
            symbol,
            rect: AtlasRect::new(x, 0, 4, 4),
            bearing: (0, 0),
            advance: 5.0,
        };
        FontAtlasData::new(
            "Test Mono",
            12.0,
            LineMetrics::new(9.0, -3.0, 0.0),
            (16, 8),
            vec![glyph('?', 0), glyph('A', 5)],
            vec![],
            (0..16 * 8).map(|i| i as u8).collect(),
        )
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("glint-atlas-{}-{name}", std::process::id()))
    }

    #[test]
    fn written_atlas_is_read_back_from_disk() {
        let path = temp_path("ok.atlas");
        let size = write_verified(&atlas(), &path).unwrap();

        assert_eq!(size as u64, fs::metadata(&path).unwrap().len());
        assert!(FontAtlasData::from_binary(&fs::read(&path).unwrap()).is_ok());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let path = temp_path("missing-dir").join("out.atlas");
        assert!(write_verified(&atlas(), &path).is_err());
    }
}
