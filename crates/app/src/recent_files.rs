//! Recently opened files.
//!
//! Tracks the last few PDFs the user opened and persists them to the
//! platform data directory. The list backs the "Recent" menu in the
//! toolbar.

use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of entries kept in the list.
const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RecentFilesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid recent-files store: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered list of recently opened files, most recent first.
#[derive(Debug, Clone)]
pub struct RecentFiles {
    files: Vec<PathBuf>,
    storage_path: PathBuf,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self { files: Vec::new(), storage_path: Self::default_storage_path() }
    }

    #[cfg(test)]
    fn with_storage_path<P: AsRef<Path>>(path: P) -> Self {
        Self { files: Vec::new(), storage_path: path.as_ref().to_path_buf() }
    }

    /// Platform data directory, e.g. `~/.local/share/paperdesk/recent_files.json`
    /// on Linux. Falls back to the working directory when none is known.
    fn default_storage_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paperdesk")
            .join("recent_files.json")
    }

    /// Adds a file, moving duplicates to the front and capping the list.
    pub fn add<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref().to_path_buf();

        self.files.retain(|existing| existing != &path);
        self.files.insert(0, path);
        self.files.truncate(MAX_RECENT_FILES);
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Loads the list, dropping entries whose files no longer exist.
    /// A missing store is an empty list, not an error.
    pub fn load(&mut self) -> Result<(), RecentFilesError> {
        if !self.storage_path.exists() {
            return Ok(());
        }

        let contents = fs::read_to_string(&self.storage_path)?;
        self.files = serde_json::from_str(&contents)?;
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
    fn add_keeps_most_recent_first() {
        let mut recent = RecentFiles::new();
        recent.add("/docs/a.pdf");
        recent.add("/docs/b.pdf");

        assert_eq!(recent.files(), [PathBuf::from("/docs/b.pdf"), PathBuf::from("/docs/a.pdf")]);
    }

    #[test]
    fn re_adding_moves_to_front() {
        let mut recent = RecentFiles::new();
        recent.add("/docs/a.pdf");
        recent.add("/docs/b.pdf");
        recent.add("/docs/a.pdf");

        assert_eq!(recent.files(), [PathBuf::from("/docs/a.pdf"), PathBuf::from("/docs/b.pdf")]);
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
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("recent_files.json");
        let tracked = temp.path().join("kept.pdf");
        fs::write(&tracked, b"pdf bytes").unwrap();

        let mut recent = RecentFiles::with_storage_path(&storage);
        recent.add(&tracked);
        recent.save().unwrap();

        let mut loaded = RecentFiles::with_storage_path(&storage);
        loaded.load().unwrap();

        assert_eq!(loaded.files(), [tracked]);
    }

    #[test]
    fn load_drops_missing_files() {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("recent_files.json");
        fs::write(&storage, r#"["/nonexistent/file.pdf"]"#).unwrap();

        let mut recent = RecentFiles::with_storage_path(&storage);
        recent.load().unwrap();

        assert!(recent.files().is_empty());
    }

    #[test]
    fn load_without_store_is_empty() {
        let temp = TempDir::new().unwrap();

        let mut recent = RecentFiles::with_storage_path(temp.path().join("none.json"));
        recent.load().unwrap();

        assert!(recent.files().is_empty());
    }

    #[test]
    fn load_rejects_corrupt_store() {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("recent_files.json");
        fs::write(&storage, "not json").unwrap();

        let mut recent = RecentFiles::with_storage_path(&storage);
        assert!(matches!(recent.load(), Err(RecentFilesError::Parse(_))));
    }
}
