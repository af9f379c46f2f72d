//! Changelog types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A classified commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    /// Full hash
    pub hash: String,
    /// Abbreviated hash
    pub short_hash: String,
    /// Conventional type (`feat`, `fix`, ...); `None` for non-conventional headers
    pub commit_type: Option<String>,
    /// Scope in parentheses
    pub scope: Option<String>,
    /// Description after the colon, or the whole header when not conventional
    pub message: String,
    /// Body without footers
    pub body: Option<String>,
    /// Footer fields
    pub footers: Vec<Footer>,
    /// Author name
    pub author: Option<String>,
    /// Author date
    pub date: Option<DateTime<Utc>>,
    /// Whether the commit is a breaking change
    pub breaking: bool,
}

impl GitCommit {
    /// Description of the breaking change: the footer text when present, else the message
    pub fn breaking_description(&self) -> String {
        self.footers
            .iter()
            .find(|f| f.is_breaking())
            .map(|f| f.value.clone())
            .unwrap_or_else(|| self.message.clone())
    }
}

/// A footer field such as `Refs: #12` or `BREAKING CHANGE: ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer token
    pub token: String,
    /// Footer value
    pub value: String,
}

impl Footer {
    /// Whether this footer marks a breaking change
    pub fn is_breaking(&self) -> bool {
        self.token.eq_ignore_ascii_case("BREAKING CHANGE")
            || self.token.eq_ignore_ascii_case("BREAKING-CHANGE")
    }
}

/// Hand-written notes for one version.
///
/// Stored as YAML and merged additively with what is detected from commits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseNotes {
    /// Headline items
    pub highlights: Vec<String>,
    /// Breaking change descriptions
    pub breaking_changes: Vec<String>,
    /// Contributor names
    pub contributors: Vec<String>,
}

impl ReleaseNotes {
    /// Merge `other` into `self`, keeping the existing order and skipping duplicates
    pub fn merge(&mut self, other: &ReleaseNotes) {
        merge_unique(&mut self.highlights, &other.highlights);
        merge_unique(&mut self.breaking_changes, &other.breaking_changes);
        merge_unique(&mut self.contributors, &other.contributors);
    }

    /// Whether there is nothing in the notes
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.breaking_changes.is_empty() && self.contributors.is_empty()
    }
}

fn merge_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !target.iter().any(|t| t.trim() == trimmed) {
            target.push(trimmed.to_string());
        }
    }
}

/// A group of commits of one type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Type key, `None` for the "Other" bucket
    pub key: Option<String>,
    /// Section title
    pub title: String,
    /// Optional emoji shown before the title
    pub emoji: Option<String>,
    /// Commits in this section, oldest first
    pub commits: Vec<GitCommit>,
}

impl Section {
    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Title with the emoji prefix when one is set
    pub fn heading(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.title),
            None => self.title.clone(),
        }
    }
}

/// Commit statistics for a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogStats {
    /// Number of commits considered
    pub commits: usize,
    /// Number of distinct authors
    pub contributors: usize,
    /// Number of breaking commits
    pub breaking: usize,
    /// Commits per type; non-conventional commits are counted under `other`
    pub by_type: BTreeMap<String, usize>,
}

/// A changelog entry for one version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Version string
    pub version: String,
    /// Release date
    pub date: DateTime<Utc>,
    /// Sections in taxonomy order, "Other" last
    pub sections: Vec<Section>,
    /// Detected data merged with hand-written notes
    pub notes: ReleaseNotes,
    /// Commit statistics
    pub stats: ChangelogStats,
}

impl ChangelogEntry {
    /// Check if entry has any content
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.notes.is_empty()
    }
}
