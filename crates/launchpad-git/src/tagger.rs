//! Git tags for version backups

use std::path::PathBuf;

use launchpad_core::version::BackupTagger;
use launchpad_core::{LaunchpadError, Result};
use tracing::debug;

use crate::repository::GitRepo;

/// Tags HEAD of the repository containing `path` whenever a backup is taken
#[derive(Debug, Clone)]
pub struct GitTagger {
    path: PathBuf,
}

impl GitTagger {
    /// Create a tagger for the repository discovered from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackupTagger for GitTagger {
    fn tag_backup(&self, name: &str, message: &str) -> Result<()> {
        // git2 handles are not Sync, so the repository is opened per call
        let repo = GitRepo::discover(&self.path).map_err(|e| LaunchpadError::other(e.to_string()))?;
        repo.create_tag(name, Some(message))
            .map_err(|e| LaunchpadError::other(e.to_string()))?;
        debug!(name, "tagged backup");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commits::tests::commit_file;
    use git2::Repository;
    use tempfile::TempDir;

    #[test]
    fn test_tag_backup() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        commit_file(&repo, temp.path(), "a.txt", "chore: init");

        let tagger = GitTagger::new(temp.path());
        tagger
            .tag_backup("launchpad-backup/1.0.0-20240101-000000000", "backup")
            .unwrap();

        let git = GitRepo::open(temp.path()).unwrap();
        assert!(git
            .find_tag("launchpad-backup/1.0.0-20240101-000000000")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_tag_outside_repo_fails() {
        let temp = TempDir::new().unwrap();
        assert!(GitTagger::new(temp.path()).tag_backup("x", "y").is_err());
    }
}
