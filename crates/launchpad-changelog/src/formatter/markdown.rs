//! Markdown changelog formatter

use launchpad_core::config::ChangelogConfig;
use tracing::{debug, instrument};

use super::ChangelogFormatter;
use crate::types::{ChangelogEntry, GitCommit};

/// Markdown changelog formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self
    }

    fn format_commit(&self, output: &mut String, commit: &GitCommit, config: &ChangelogConfig) {
        output.push_str(&format!("- {}", commit.message));

        if let Some(scope) = &commit.scope {
            output.push_str(&format!(" ({})", scope));
        }

        if config.include_hashes && !commit.short_hash.is_empty() {
            match config.repo_url.as_deref().map(|u| u.trim_end_matches('/')) {
                Some(repo_url) if !repo_url.is_empty() => output.push_str(&format!(
                    " ([{}]({}/commit/{}))",
                    commit.short_hash, repo_url, commit.hash
                )),
                _ => output.push_str(&format!(" ({})", commit.short_hash)),
            }
        }

        if config.include_authors {
            if let Some(author) = &commit.author {
                output.push_str(&format!(" - {}", author));
            }
        }

        output.push('\n');
    }
}

impl ChangelogFormatter for MarkdownFormatter {
    #[instrument(skip(self, entry, config), fields(version = %entry.version, section_count = entry.sections.len()))]
    fn format(&self, entry: &ChangelogEntry, config: &ChangelogConfig) -> String {
        let mut output = String::new();

        let date_str = entry.date.format("%Y-%m-%d").to_string();
        output.push_str(&format!("## [{}] - {}\n\n", entry.version, date_str));

        if !entry.notes.highlights.is_empty() {
            output.push_str("### Highlights\n\n");
            for highlight in &entry.notes.highlights {
                output.push_str(&format!("- {}\n", highlight));
            }
            output.push('\n');
        }

        if config.include_breaking_changes && !entry.notes.breaking_changes.is_empty() {
            output.push_str("### ⚠ BREAKING CHANGES\n\n");
            for change in &entry.notes.breaking_changes {
                output.push_str(&format!("- {}\n", change));
            }
            output.push('\n');
        }

        for section in &entry.sections {
            if section.is_empty() {
                continue;
            }

            output.push_str(&format!("### {}\n\n", section.heading()));
            for commit in &section.commits {
                self.format_commit(&mut output, commit, config);
            }
            output.push('\n');
        }

        if config.include_contributors && !entry.notes.contributors.is_empty() {
            output.push_str("### Contributors\n\n");
            for contributor in &entry.notes.contributors {
                output.push_str(&format!("- {}\n", contributor));
            }
            output.push('\n');
        }

        if config.include_stats {
            let stats = &entry.stats;
            output.push_str("### Stats\n\n");
            output.push_str(&format!(
                "- {} commit(s) by {} contributor(s)\n",
                stats.commits, stats.contributors
            ));
            if stats.breaking > 0 {
                output.push_str(&format!("- {} breaking change(s)\n", stats.breaking));
            }
            for (ty, count) in &stats.by_type {
                output.push_str(&format!("- {}: {}\n", ty, count));
            }
            output.push('\n');
        }

        debug!(output_len = output.len(), "markdown changelog formatted");
        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangelogStats, ReleaseNotes, Section};
    use chrono::Utc;

    fn commit(message: &str, scope: Option<&str>) -> GitCommit {
        GitCommit {
            hash: "abc1234567890".to_string(),
            short_hash: "abc1234".to_string(),
            commit_type: Some("feat".to_string()),
            scope: scope.map(str::to_string),
            message: message.to_string(),
            body: None,
            footers: vec![],
            author: Some("Ana".to_string()),
            date: None,
            breaking: false,
        }
    }

    fn entry() -> ChangelogEntry {
        ChangelogEntry {
            version: "1.0.0".to_string(),
            date: Utc::now(),
            sections: vec![Section {
                key: Some("feat".to_string()),
                title: "Features".to_string(),
                emoji: Some("✨".to_string()),
                commits: vec![commit("add new feature", Some("ui"))],
            }],
            notes: ReleaseNotes {
                highlights: vec!["Fresh look".to_string()],
                breaking_changes: vec!["drop Android 7".to_string()],
                contributors: vec!["Ana".to_string()],
            },
            stats: ChangelogStats {
                commits: 1,
                contributors: 1,
                breaking: 0,
                by_type: [("feat".to_string(), 1)].into_iter().collect(),
            },
        }
    }

    #[test]
    fn test_format_basic() {
        let output = MarkdownFormatter::new().format(&entry(), &ChangelogConfig::default());

        assert!(output.starts_with("## [1.0.0] - "));
        assert!(output.contains("### Highlights\n\n- Fresh look"));
        assert!(output.contains("### ✨ Features"));
        assert!(output.contains("- add new feature (ui) (abc1234)\n"));
        assert!(output.contains("### ⚠ BREAKING CHANGES"));
        assert!(output.contains("### Contributors"));
        assert!(!output.contains("### Stats"));
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut config = ChangelogConfig::default();
        config.include_breaking_changes = false;
        config.include_contributors = false;
        config.include_stats = true;
        config.include_hashes = false;
        config.include_authors = true;

        let output = MarkdownFormatter::new().format(&entry(), &config);
        assert!(!output.contains("BREAKING CHANGES"));
        assert!(!output.contains("### Contributors"));
        assert!(output.contains("### Stats"));
        assert!(output.contains("- feat: 1"));
        assert!(output.contains("- add new feature (ui) - Ana\n"));
    }

    #[test]
    fn test_repo_links() {
        let mut config = ChangelogConfig::default();
        assert!(MarkdownFormatter::new()
            .format(&entry(), &config)
            .contains(" (abc1234)"));

        config.repo_url = Some("https://github.com/acme/app/".to_string());
        let output = MarkdownFormatter::new().format(&entry(), &config);
        assert!(output.contains("([abc1234](https://github.com/acme/app/commit/abc1234567890))"));
    }
}
