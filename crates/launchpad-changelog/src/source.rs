//! Where commits come from

use launchpad_core::ChangelogError;
use launchpad_git::{CommitInfo, GitRepo};

use crate::Result;

/// Reads commit history, oldest first
pub trait CommitSource {
    /// Commits after `since` (a tag, branch or hash) up to HEAD; all history when `None`
    fn commits_since(&self, since: Option<&str>) -> Result<Vec<CommitInfo>>;

    /// Most recent tag that starts with `prefix` and parses as a version
    fn latest_tag(&self, prefix: &str) -> Result<Option<String>>;
}

impl CommitSource for GitRepo {
    fn commits_since(&self, since: Option<&str>) -> Result<Vec<CommitInfo>> {
        GitRepo::commits_since(self, since)
            .map_err(|e| ChangelogError::HistoryUnavailable(e.to_string()))
    }

    fn latest_tag(&self, prefix: &str) -> Result<Option<String>> {
        self.latest_version_tag(prefix)
            .map(|tag| tag.map(|t| t.name))
            .map_err(|e| ChangelogError::HistoryUnavailable(e.to_string()))
    }
}
