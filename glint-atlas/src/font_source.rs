use std::{
    fmt,
    path::{Path, PathBuf},
};

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use tracing::{debug, info};

use crate::AtlasError;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "otc"];

/// Where the font bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// A font file on disk
    Path(PathBuf),
    /// A family name looked up in the system font database; the generic
    /// names `monospace`, `sans-serif` and `serif` are accepted too
    Family(String),
}

impl FontSource {
    /// Interprets `s` as a path when it names an existing file or ends in a
    /// font file extension, as a family name otherwise.
    pub fn parse(s: &str) -> Self {
        let path = Path::new(s);
        let has_font_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        if path.is_file() || has_font_extension {
            FontSource::Path(path.to_path_buf())
        } else {
            FontSource::Family(s.to_string())
        }
    }

    /// Reads the font bytes.
    pub fn load(&self) -> Result<FontData, AtlasError> {
        match self {
            FontSource::Path(path) => {
                let data = std::fs::read(path)
                    .map_err(|source| AtlasError::FontRead { path: path.clone(), source })?;
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());

                debug!(path = %path.display(), bytes = data.len(), "loaded font file");
                Ok(FontData { name, data, index: 0 })
            },
            FontSource::Family(family) => load_family(family),
        }
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Path(path) => write!(f, "{}", path.display()),
            FontSource::Family(family) => f.write_str(family),
        }
    }
}

/// Raw font file contents.
#[derive(Clone)]
pub struct FontData {
    /// Family name, or the file stem for fonts loaded from a path
    pub name: String,
    pub data: Vec<u8>,
    /// Face index inside font collections
    pub index: u32,
}

impl fmt::Debug for FontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontData")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Sorted, deduplicated family names of the installed fonts.
pub fn list_families() -> Vec<String> {
    let db = system_database();

    let mut families: Vec<String> = db
        .faces()
        .filter_map(|face| face.families.first())
        .map(|(name, _)| name.clone())
        .collect();
    families.sort_unstable_by_key(|name| name.to_lowercase());
    families.dedup();
    families
}

fn system_database() -> Database {
    let mut db = Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "loaded system font database");
    db
}

fn load_family(family: &str) -> Result<FontData, AtlasError> {
    let db = system_database();

    let families = [generic_family(family)];
    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db
        .query(&query)
        .ok_or_else(|| AtlasError::FontNotFound(family.to_string()))?;

    let name = db
        .face(id)
        .and_then(|face| face.families.first())
        .map_or_else(|| family.to_string(), |(name, _)| name.clone());

    let (data, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| AtlasError::FontNotFound(family.to_string()))?;

    info!(requested = family, resolved = %name, "resolved font family");
    Ok(FontData { name, data, index })
}

fn generic_family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "monospace" | "mono" => Family::Monospace,
        "sans-serif" | "sans" => Family::SansSerif,
        "serif" => Family::Serif,
        _ => Family::Name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_files_are_paths() {
        assert_eq!(
            FontSource::parse("fonts/Hack-Regular.ttf"),
            FontSource::Path(PathBuf::from("fonts/Hack-Regular.ttf"))
        );
        assert_eq!(
            FontSource::parse("/nonexistent/Font.OTF"),
            FontSource::Path(PathBuf::from("/nonexistent/Font.OTF"))
        );
    }

    #[test]
    fn other_names_are_families() {
        assert_eq!(
            FontSource::parse("JetBrains Mono"),
            FontSource::Family("JetBrains Mono".into())
        );
        assert_eq!(FontSource::parse("monospace"), FontSource::Family("monospace".into()));
    }

    #[test]
    fn generic_names_map_to_fontdb_families() {
        assert_eq!(generic_family("Monospace"), Family::Monospace);
        assert_eq!(generic_family("sans-serif"), Family::SansSerif);
        assert_eq!(generic_family("Fira Code"), Family::Name("Fira Code"));
    }

    #[test]
    fn missing_files_fail_to_load() {
        let err = FontSource::Path(PathBuf::from("/nonexistent/glint-test.ttf"))
            .load()
            .unwrap_err();
        assert!(matches!(err, AtlasError::FontRead { .. }), "{err}");
    }
}
