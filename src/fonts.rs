//! Font database shared by every export.
//!
//! Fonts are scanned once, off the UI thread; awaiting [`FontLibrary::ready`] is the
//! point after which text metrics can be trusted.

use crate::config::AppConfig;
use crate::error::ExportError;
use crate::style::FontFamily;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Families tried, in order, for the generic `sans-serif` fallback.
const SANS_SERIF_CANDIDATES: [&str; 5] = ["Arial", "Liberation Sans", "DejaVu Sans", "Noto Sans", "Helvetica"];

/// Lazily loaded font database.
pub struct FontLibrary {
    fonts_dir: Option<PathBuf>,
    system_fonts: bool,
    db: OnceCell<Arc<fontdb::Database>>,
}

impl FontLibrary {
    /// Creates a library that will load `fonts_dir` and, optionally, the system fonts.
    pub fn new(fonts_dir: Option<PathBuf>, system_fonts: bool) -> Self {
        Self {
            fonts_dir,
            system_fonts,
            db: OnceCell::new(),
        }
    }

    /// Creates a library from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Some(config.fonts_dir.clone()), config.system_fonts)
    }

    /// A library with no fonts at all. Text renders as nothing; useful in tests.
    pub fn empty() -> Self {
        Self::new(None, false)
    }

    /// Waits until the font database is loaded and returns it.
    pub async fn ready(&self) -> Result<Arc<fontdb::Database>, ExportError> {
        let fonts_dir = self.fonts_dir.clone();
        let system_fonts = self.system_fonts;
        let db = self
            .db
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || build_database(fonts_dir, system_fonts))
                    .await
                    .map(Arc::new)
                    .map_err(|e| ExportError::Fonts(e.to_string()))
            })
            .await?;
        Ok(Arc::clone(db))
    }
}

fn build_database(fonts_dir: Option<PathBuf>, system_fonts: bool) -> fontdb::Database {
    let mut db = fontdb::Database::new();
    if system_fonts {
        db.load_system_fonts();
    }
    if let Some(dir) = fonts_dir {
        if dir.is_dir() {
            db.load_fonts_dir(&dir);
        } else {
            log::warn!("Fonts directory {} not found", dir.display());
        }
    }
    for family in [FontFamily::Oswald, FontFamily::PlayfairDisplay] {
        log::debug!("Font {} available: {}", family.name(), has_family(&db, family.name()));
    }
    match resolve_sans_serif(&mut db) {
        Some(family) => log::debug!("Generic sans-serif resolves to {}", family),
        None => log::warn!("No font faces loaded; exported text will be empty"),
    }
    log::info!("Loaded {} font faces", db.len());
    db
}

/// Points the generic `sans-serif` family at an installed face.
///
/// Every text run ends its family list with `sans-serif`, and fontdb maps that to Arial
/// by default. Without this, machines lacking Arial drop text silently.
fn resolve_sans_serif(db: &mut fontdb::Database) -> Option<String> {
    let installed = |wanted: &str| {
        db.faces()
            .flat_map(|face| face.families.iter())
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(name, _)| name.clone())
    };
    let family = SANS_SERIF_CANDIDATES
        .iter()
        .find_map(|candidate| installed(candidate))
        .or_else(|| {
            db.faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        })?;
    db.set_sans_serif_family(family.clone());
    Some(family)
}

/// Whether any face in `db` belongs to `family`.
pub fn has_family(db: &fontdb::Database, family: &str) -> bool {
    db.faces()
        .any(|face| face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_library_is_ready_and_cached() {
        let library = FontLibrary::empty();
        let first = library.ready().await.unwrap();
        let second = library.ready().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 0);
        assert!(!has_family(&first, "Oswald"));
    }

    /// The sans face egui bundles, so tests do not depend on installed fonts.
    fn bundled_sans() -> Vec<u8> {
        let defs = egui::FontDefinitions::default();
        let name = defs.families[&egui::FontFamily::Proportional][0].clone();
        defs.font_data[&name].font.to_vec()
    }

    #[tokio::test]
    async fn sans_serif_falls_back_to_an_installed_face() {
        let dir = std::env::temp_dir().join(format!("billboard-fonts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bundled-sans.ttf"), bundled_sans()).unwrap();

        let library = FontLibrary::new(Some(dir.clone()), false);
        let db = library.ready().await.unwrap();
        assert!(db.len() > 0);
        assert!(!has_family(&db, "Arial"));
        let query = fontdb::Query {
            families: &[fontdb::Family::SansSerif],
            ..Default::default()
        };
        assert!(db.query(&query).is_some());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_database_has_no_sans_serif() {
        let mut db = fontdb::Database::new();
        assert_eq!(resolve_sans_serif(&mut db), None);
    }

    #[tokio::test]
    async fn missing_directory_is_not_fatal() {
        let library = FontLibrary::new(Some(PathBuf::from("/definitely/not/here")), false);
        assert!(library.ready().await.is_ok());
    }
}
