//! Repository handle

use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository};
use tracing::{debug, instrument};

use crate::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// An opened repository and its working directory.
///
/// The handle is not `Sync`; callers that need history from several tasks
/// open one handle each.
pub struct GitRepo {
    pub(crate) repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository rooted exactly at `path`
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepositoryNotFound(path.to_path_buf()),
            _ => GitError::OpenFailed(e.to_string()),
        })?;
        Ok(Self::wrap(repo))
    }

    /// Open the repository containing `start`, walking up parent directories
    #[instrument(fields(start = %start.display()))]
    pub fn discover(start: &Path) -> Result<Self> {
        let repo = Repository::discover(start).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::NotARepository(start.to_path_buf()),
            _ => GitError::OpenFailed(e.to_string()),
        })?;
        Ok(Self::wrap(repo))
    }

    fn wrap(repo: Repository) -> Self {
        let root = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!(root = %root.display(), "repository opened");
        Self { repo, root }
    }

    /// Working directory (the `.git` directory for bare repositories)
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Commit HEAD points at; `NoCommits` on an unborn branch
    pub(crate) fn head_commit(&self) -> Result<git2::Commit<'_>> {
        let head = self.repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch => GitError::NoCommits,
            _ => GitError::Git2(e),
        })?;
        Ok(head.peel_to_commit()?)
    }
}
