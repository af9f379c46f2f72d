//! Hand-written release notes stored next to the project

use std::path::{Path, PathBuf};

use launchpad_core::ChangelogError;
use tracing::debug;

use crate::types::ReleaseNotes;
use crate::Result;

/// Reads and writes `<dir>/<version>.yaml` release notes
#[derive(Debug, Clone)]
pub struct ReleaseNotesStore {
    dir: PathBuf,
}

impl ReleaseNotesStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the notes file for `version`
    pub fn path_for(&self, version: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", version))
    }

    /// Load notes for `version`; a missing file is `Ok(None)`
    pub fn load(&self, version: &str) -> Result<Option<ReleaseNotes>> {
        let path = self.path_for(version);
        if !path.is_file() {
            debug!(path = %path.display(), "no release notes for version");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let notes = serde_yaml::from_str(&content).map_err(|e| invalid(&path, e))?;
        Ok(Some(notes))
    }

    /// Save notes for `version`, creating the directory when needed
    pub fn save(&self, version: &str, notes: &ReleaseNotes) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(version);
        let content = serde_yaml::to_string(notes).map_err(|e| invalid(&path, e))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

fn invalid(path: &Path, e: serde_yaml::Error) -> ChangelogError {
    ChangelogError::InvalidReleaseNotes {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing() {
        let temp = TempDir::new().unwrap();
        let store = ReleaseNotesStore::new(temp.path());
        assert!(store.load("1.0.0").unwrap().is_none());
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("2.0.0.yaml"),
            "highlights:\n  - Offline mode\n",
        )
        .unwrap();

        let notes = ReleaseNotesStore::new(temp.path())
            .load("2.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(notes.highlights, vec!["Offline mode"]);
        assert!(notes.contributors.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = ReleaseNotesStore::new(temp.path().join("notes"));
        let notes = ReleaseNotes {
            highlights: vec!["New onboarding".to_string()],
            ..Default::default()
        };
        store.save("1.1.0", &notes).unwrap();
        assert_eq!(store.load("1.1.0").unwrap(), Some(notes));
    }

    #[test]
    fn test_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("1.0.0.yaml"), "highlights: [unclosed").unwrap();
        let err = ReleaseNotesStore::new(temp.path()).load("1.0.0").unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidReleaseNotes { .. }));
    }
}
