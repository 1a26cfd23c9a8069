//! Recently opened documents.
//!
//! Persisted as a JSON array of paths under the platform data directory and
//! used to populate the Open menu. Entries whose files have disappeared are
//! dropped at load time.

use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of recent files to track
const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RecentFilesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct RecentFiles {
    /// Most recent first.
    files: Vec<PathBuf>,
    storage_path: PathBuf,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self { files: Vec::new(), storage_path: Self::default_storage_path() }
    }

    #[cfg(test)]
    pub fn with_storage_path<P: AsRef<Path>>(path: P) -> Self {
        Self { files: Vec::new(), storage_path: path.as_ref().to_path_buf() }
    }

    fn default_storage_path() -> PathBuf {
        if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("pdf-reader").join("recent_files.json")
        } else {
            PathBuf::from("recent_files.json")
        }
    }

    /// Record a file as most recently opened, deduplicating and capping the
    /// list.
    pub fn add<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref().to_path_buf();
        self.files.retain(|existing| existing != &path);
        self.files.insert(0, path);
        self.files.truncate(MAX_RECENT_FILES);
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn load(&mut self) -> Result<(), RecentFilesError> {
        if !self.storage_path.exists() {
            return Ok(());
        }

        let contents = fs::read_to_string(&self.storage_path)?;
        self.files = serde_json::from_str::<Vec<PathBuf>>(&contents)?;
        self.files.retain(|path| path.exists());

        Ok(())
    }

    pub fn save(&self) -> Result<(), RecentFilesError> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.files)?;
        fs::write(&self.storage_path, json)?;
        Ok(())
    }
}

impl Default for RecentFiles {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_puts_newest_first_and_deduplicates() {
        let mut recent = RecentFiles::new();
        recent.add("/docs/a.pdf");
        recent.add("/docs/b.pdf");
        recent.add("/docs/a.pdf");

        assert_eq!(recent.files().len(), 2);
        assert_eq!(recent.files()[0], PathBuf::from("/docs/a.pdf"));
        assert_eq!(recent.files()[1], PathBuf::from("/docs/b.pdf"));
    }

    #[test]
    fn list_is_capped() {
        let mut recent = RecentFiles::new();
        for index in 0..15 {
            recent.add(format!("/docs/file{index}.pdf"));
        }

        assert_eq!(recent.files().len(), MAX_RECENT_FILES);
        assert_eq!(recent.files()[0], PathBuf::from("/docs/file14.pdf"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp_dir = TempDir::new().expect("temp dir should create");
        let storage_path = temp_dir.path().join("recent_files.json");
        let document = temp_dir.path().join("kept.pdf");
        fs::write(&document, b"stub").expect("fixture should write");

        let mut recent = RecentFiles::with_storage_path(&storage_path);
        recent.add(&document);
        recent.add("/nonexistent/gone.pdf");
        recent.save().expect("save should succeed");

        let mut loaded = RecentFiles::with_storage_path(&storage_path);
        loaded.load().expect("load should succeed");

        // The vanished entry is filtered out.
        assert_eq!(loaded.files(), &[document]);
    }

    #[test]
    fn loading_without_a_stored_file_is_fine() {
        let temp_dir = TempDir::new().expect("temp dir should create");
        let mut recent = RecentFiles::with_storage_path(temp_dir.path().join("missing.json"));

        assert!(recent.load().is_ok());
        assert!(recent.files().is_empty());
    }

    #[test]
    fn malformed_storage_is_a_parse_error() {
        let temp_dir = TempDir::new().expect("temp dir should create");
        let storage_path = temp_dir.path().join("recent_files.json");
        fs::write(&storage_path, b"not json").expect("fixture should write");

        let mut recent = RecentFiles::with_storage_path(&storage_path);
        assert!(matches!(recent.load(), Err(RecentFilesError::Parse(_))));
    }
}
