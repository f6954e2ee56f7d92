//! Loading and atomically saving the catalog file.

use crate::catalog::StringCatalog;
use crate::error::{Result, TranslateError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk location a catalog is loaded from and saved back to.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the catalog.
    ///
    /// A missing, unreadable or malformed file is a load error; nothing is
    /// written in that case.
    pub fn load(&self, source_override: Option<&str>) -> Result<StringCatalog> {
        let text = fs::read_to_string(&self.path).map_err(|e| TranslateError::CatalogLoad {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        StringCatalog::parse(&text, source_override).map_err(|e| TranslateError::CatalogLoad {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Write the catalog back to its file.
    ///
    /// The content goes to a sibling temporary file which is synced and then
    /// renamed over the target, so an interrupted write never leaves the
    /// previous version truncated.
    pub fn save(&self, catalog: &StringCatalog) -> Result<()> {
        let contents = catalog
            .to_json_string()
            .map_err(|e| self.persistence_error(e))?;
        write_atomic(&self.path, &contents).map_err(|e| self.persistence_error(e))?;
        debug!("Saved catalog to {}", self.path.display());
        Ok(())
    }

    fn persistence_error(&self, err: impl std::fmt::Display) -> TranslateError {
        TranslateError::Persistence {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

/// Path of the temporary file used while saving `path`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let temp_path = temp_path_for(path);

    let result = (|| {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        // Clean up temp file on failure
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
  "sourceLanguage": "en",
  "strings": {
    "Cancel": {}
  },
  "version": "1.0"
}"#;

    fn write_catalog(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("Localizable.xcstrings");
        fs::write(&path, contents).expect("Failed to write catalog");
        path
    }

    #[test]
    fn test_load_success() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(write_catalog(&dir, CATALOG));

        let catalog = store.load(None).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.source_language(), "en");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(dir.path().join("missing.xcstrings"));

        let err = store.load(None).unwrap_err();
        assert!(matches!(err, TranslateError::CatalogLoad { .. }));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("missing.xcstrings"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(write_catalog(&dir, "{ \"strings\": "));

        let err = store.load(None).unwrap_err();
        assert!(matches!(err, TranslateError::CatalogLoad { .. }));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_load_missing_strings_field() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(write_catalog(&dir, r#"{"sourceLanguage": "en"}"#));

        let err = store.load(None).unwrap_err();
        assert!(err.to_string().contains("missing 'strings' field"));
    }

    #[test]
    fn test_save_then_load_keeps_translation() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(write_catalog(&dir, CATALOG));

        let mut catalog = store.load(None).unwrap();
        catalog.set_translation("Cancel", "fr", "Annuler".to_string());
        store.save(&catalog).unwrap();

        let reloaded = store.load(None).unwrap();
        assert_eq!(
            reloaded.unit("Cancel").unwrap().translation("fr").unwrap().value(),
            "Annuler"
        );
    }

    #[test]
    fn test_save_unmodified_is_byte_identical_for_pretty_input() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, CATALOG);
        let store = CatalogStore::new(&path);

        let catalog = store.load(None).unwrap();
        store.save(&catalog).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), CATALOG);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, CATALOG);
        let store = CatalogStore::new(&path);

        let catalog = store.load(None).unwrap();
        store.save(&catalog).unwrap();

        assert!(!temp_path_for(&path).exists());
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = CatalogStore::new(write_catalog(&dir, CATALOG));
        let catalog = store.load(None).unwrap();

        let broken = CatalogStore::new(dir.path().join("gone").join("Localizable.xcstrings"));
        let err = broken.save(&catalog).unwrap_err();
        assert!(matches!(err, TranslateError::Persistence { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/tmp/app/Localizable.xcstrings");
        assert_eq!(
            temp_path_for(path),
            PathBuf::from("/tmp/app/Localizable.xcstrings.tmp")
        );
    }
}
