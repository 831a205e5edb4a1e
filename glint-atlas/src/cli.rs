use std::{ops::RangeInclusive, path::PathBuf};

use clap::Parser;
use color_eyre::{Report, eyre::eyre};
use glint_atlas::{
    AtlasConfig, Charset, FontSource,
    charset::parse_unicode_range,
    packer::{DEFAULT_MAX_ATLAS_SIZE, MIN_ATLAS_SIZE},
};

#[derive(Parser, Debug)]
#[command(
    name = "glint-atlas",
    version,
    about = "Font atlas generator for the glint OpenGL toolkit",
    long_about = "Rasterizes a TTF/OTF font, packs the glyphs into a single-channel texture and \
                  stores glyph metrics and kerning in a compact binary atlas"
)]
pub struct Cli {
    /// Font file path or installed family name ("monospace" picks the system default)
    #[arg(value_name = "FONT", required_unless_present = "list_fonts")]
    pub font: Option<String>,

    /// Font size in pixels
    #[arg(short = 's', long = "size", default_value = "32.0", value_name = "PX")]
    pub font_size: f32,

    /// Unicode ranges in hex format (e.g., 0x2580..0x259F) from which to include glyphs. ASCII
    /// (0x20-0x7E) is always included.
    #[arg(short, long = "range", value_parser = parse_unicode_range)]
    pub ranges: Vec<RangeInclusive<char>>,

    /// File containing additional symbols to include in the atlas
    #[arg(long, value_parser = validate_file_exists)]
    pub symbols_file: Option<PathBuf>,

    /// Free pixels around each glyph
    #[arg(short, long, default_value = "1", value_name = "PX")]
    pub padding: u32,

    /// Largest allowed texture width or height; must be a power of two
    #[arg(long, default_value_t = DEFAULT_MAX_ATLAS_SIZE, value_name = "PX")]
    pub max_texture_size: u32,

    /// Output file path
    #[arg(short = 'o', long, default_value = "./font.atlas", value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the atlas texture as a grayscale PNG
    #[arg(long, value_name = "PATH")]
    pub png: Option<PathBuf>,

    /// List installed font families and exit
    #[arg(short = 'L', long)]
    pub list_fonts: bool,
}

impl Cli {
    pub fn font_source(&self) -> Result<FontSource, Report> {
        self.font
            .as_deref()
            .map(FontSource::parse)
            .ok_or_else(|| eyre!("Font selection required"))
    }

    pub fn atlas_config(&self) -> AtlasConfig {
        AtlasConfig {
            font_size: self.font_size,
            padding: self.padding,
            max_texture_size: self.max_texture_size,
        }
    }

    /// Validates the CLI arguments
    pub fn validate(&self) -> Result<(), Report> {
        if self.font_size <= 0.0 {
            return Err(eyre!("Font size must be positive"));
        }

        if !self.max_texture_size.is_power_of_two() || self.max_texture_size < MIN_ATLAS_SIZE {
            return Err(eyre!(
                "Max texture size must be a power of two of at least {MIN_ATLAS_SIZE}"
            ));
        }

        if self.padding >= self.max_texture_size / 2 {
            return Err(eyre!("Padding must be smaller than half the max texture size"));
        }

        Ok(())
    }

    pub fn charset(&self) -> Result<Charset, Report> {
        let charset = self
            .ranges
            .iter()
            .cloned()
            .fold(Charset::ascii(), Charset::with_range);

        Ok(charset.with_symbols(&self.read_symbols_file()?))
    }

    fn read_symbols_file(&self) -> Result<String, Report> {
        match &self.symbols_file {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| eyre!("Failed to read symbols file '{}': {}", path.display(), e)),
            None => Ok(String::new()),
        }
    }

    /// Prints a summary of the configuration
    pub fn print_summary(&self, font_name: &str, charset: &Charset) {
        println!("\nGenerating font atlas:");
        println!("  Font: {font_name}");
        println!("  Size: {}px", self.font_size);
        println!("  Characters: {}", charset.len());
        println!("  Padding: {}px", self.padding);
        println!("  Output: {}", self.output.display());
    }

    /// Displays the list of installed font families
    pub fn display_font_list() {
        println!("Discovering fonts...");
        let families = glint_atlas::list_families();

        if families.is_empty() {
            println!("No fonts found!");
            return;
        }

        println!("\nInstalled font families:");
        println!("{}", "-".repeat(50));
        for family in &families {
            println!("  {family}");
        }

        println!("\nTotal: {} font families", families.len());
    }
}

fn validate_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    match () {
        _ if !path.exists() => Err(format!("Input file does not exist: {s}")),
        _ if !path.is_file() => Err(format!("Path is not a file: {s}")),
        _ => Ok(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("glint-atlas").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["Hack"]);

        assert_eq!(cli.font.as_deref(), Some("Hack"));
        assert_eq!(cli.font_size, 32.0);
        assert_eq!(cli.padding, 1);
        assert_eq!(cli.max_texture_size, 4096);
        assert_eq!(cli.output, PathBuf::from("./font.atlas"));
        assert!(cli.validate().is_ok());
        assert_eq!(cli.charset().unwrap(), Charset::ascii());
    }

    #[test]
    fn font_is_required_unless_listing() {
        let args = ["glint-atlas"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(parse(&["--list-fonts"]).list_fonts);
    }

    #[test]
    fn ranges_extend_the_charset() {
        let cli = parse(&["Hack", "-r", "0xA0..0xFF", "--range", "0x2580..0x259F"]);

        assert_eq!(cli.ranges.len(), 2);
        let charset = cli.charset().unwrap();
        // NBSP is dropped as layout whitespace
        assert_eq!(charset.len(), 95 + 95 + 32);
        assert!(charset.contains('▀'));
    }

    #[test]
    fn invalid_ranges_are_rejected_by_the_parser() {
        let args = ["glint-atlas", "Hack", "--range", "0x7F..0x20"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_invalid_font_size() {
        let cli = parse(&["Hack", "--size=-1.0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn max_texture_size_must_be_a_power_of_two() {
        assert!(parse(&["Hack", "--max-texture-size", "1000"]).validate().is_err());
        assert!(parse(&["Hack", "--max-texture-size", "32"]).validate().is_err());
        assert!(parse(&["Hack", "--max-texture-size", "1024"]).validate().is_ok());
    }

    #[test]
    fn font_argument_is_classified() {
        let cli = parse(&["fonts/Inconsolata.otf"]);
        assert!(matches!(cli.font_source().unwrap(), FontSource::Path(_)));
        assert!(matches!(parse(&["monospace"]).font_source().unwrap(), FontSource::Family(_)));
    }
}
