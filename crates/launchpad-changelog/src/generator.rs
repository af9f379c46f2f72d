//! Changelog generation

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use launchpad_core::config::ChangelogConfig;
use launchpad_core::BumpLevel;
use launchpad_git::CommitInfo;
use tracing::{debug, info, instrument};

use crate::formatter::formatter_for;
use crate::parser::ConventionalParser;
use crate::source::CommitSource;
use crate::taxonomy::{CommitTaxonomy, OTHER_TITLE};
use crate::types::{ChangelogEntry, ChangelogStats, GitCommit, ReleaseNotes, Section};
use crate::Result;

/// Builds changelog entries from commit history
pub struct ChangelogGenerator {
    parser: ConventionalParser,
    taxonomy: CommitTaxonomy,
    config: ChangelogConfig,
}

impl ChangelogGenerator {
    /// Create a generator using the configured taxonomy
    pub fn new(config: ChangelogConfig) -> Self {
        Self {
            parser: ConventionalParser::new().with_merges(config.include_merges),
            taxonomy: CommitTaxonomy::from_config(&config.types),
            config,
        }
    }

    /// The configuration in use
    pub fn config(&self) -> &ChangelogConfig {
        &self.config
    }

    /// Read commits after `since` from `source` and build the entry
    #[instrument(skip(self, source, notes))]
    pub fn generate_from(
        &self,
        source: &dyn CommitSource,
        version: &str,
        since: Option<&str>,
        notes: Option<&ReleaseNotes>,
    ) -> Result<ChangelogEntry> {
        let commits = source.commits_since(since)?;
        Ok(self.generate(version, &commits, notes))
    }

    /// Build an entry from commits (oldest first), merged with hand-written notes
    #[instrument(skip(self, commits, manual), fields(commit_count = commits.len()))]
    pub fn generate(
        &self,
        version: &str,
        commits: &[CommitInfo],
        manual: Option<&ReleaseNotes>,
    ) -> ChangelogEntry {
        info!(version, commit_count = commits.len(), "generating changelog entry");

        let parsed: Vec<GitCommit> = commits.iter().filter_map(|c| self.parser.parse(c)).collect();

        let stats = compute_stats(&parsed);
        let sections = self.group(&parsed);

        // Hand-written notes come first so their wording and order are kept
        let mut notes = manual.cloned().unwrap_or_default();
        notes.merge(&ReleaseNotes {
            highlights: Vec::new(),
            breaking_changes: parsed
                .iter()
                .filter(|c| c.breaking)
                .map(describe_breaking)
                .collect(),
            contributors: contributors(&parsed),
        });

        debug!(
            section_count = sections.len(),
            breaking_count = notes.breaking_changes.len(),
            "changelog sections built"
        );

        ChangelogEntry {
            version: version.to_string(),
            date: Utc::now(),
            sections,
            notes,
            stats,
        }
    }

    /// Level implied by commits: any breaking change is major, any feature
    /// minor, anything else patch
    pub fn recommended_bump(&self, commits: &[CommitInfo]) -> BumpLevel {
        let parsed: Vec<GitCommit> = commits.iter().filter_map(|c| self.parser.parse(c)).collect();
        if parsed.iter().any(|c| c.breaking) {
            BumpLevel::Major
        } else if parsed.iter().any(|c| c.commit_type.as_deref() == Some("feat")) {
            BumpLevel::Minor
        } else {
            BumpLevel::Patch
        }
    }

    /// Render an entry in the configured format
    pub fn format(&self, entry: &ChangelogEntry) -> String {
        formatter_for(self.config.format).format(entry, &self.config)
    }

    fn group(&self, commits: &[GitCommit]) -> Vec<Section> {
        let mut sections: Vec<Section> = self
            .taxonomy
            .types()
            .iter()
            .filter(|t| !t.hidden)
            .map(|t| Section {
                key: Some(t.key.clone()),
                title: t.title.clone(),
                emoji: t.emoji.clone(),
                commits: Vec::new(),
            })
            .collect();
        let mut other = Section {
            key: None,
            title: OTHER_TITLE.to_string(),
            emoji: None,
            commits: Vec::new(),
        };

        for commit in commits {
            let known = commit
                .commit_type
                .as_deref()
                .and_then(|key| self.taxonomy.get(key));

            match known {
                Some(t) if t.hidden => {}
                Some(t) => {
                    if let Some(section) = sections
                        .iter_mut()
                        .find(|s| s.key.as_deref() == Some(t.key.as_str()))
                    {
                        section.commits.push(commit.clone());
                    }
                }
                None => other.commits.push(commit.clone()),
            }
        }

        sections.push(other);
        sections.retain(|s| !s.is_empty());
        sections
    }
}

fn describe_breaking(commit: &GitCommit) -> String {
    let description = commit.breaking_description();
    match &commit.scope {
        Some(scope) => format!("{}: {}", scope, description),
        None => description,
    }
}

fn contributors(commits: &[GitCommit]) -> Vec<String> {
    let mut seen = HashSet::new();
    commits
        .iter()
        .filter_map(|c| c.author.clone())
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

fn compute_stats(commits: &[GitCommit]) -> ChangelogStats {
    let mut by_type = BTreeMap::new();
    for commit in commits {
        let key = commit.commit_type.clone().unwrap_or_else(|| "other".to_string());
        *by_type.entry(key).or_insert(0) += 1;
    }

    ChangelogStats {
        commits: commits.len(),
        contributors: contributors(commits).len(),
        breaking: commits.iter().filter(|c| c.breaking).count(),
        by_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::config::CommitTypeConfig;
    use launchpad_core::ChangelogError;

    fn make_commit(message: &str, author: &str) -> CommitInfo {
        CommitInfo::new(
            format!("{:0>40}", message.len()),
            message,
            author,
            "dev@example.com",
            Utc::now(),
        )
    }

    struct FakeSource {
        commits: Vec<CommitInfo>,
    }

    impl CommitSource for FakeSource {
        fn commits_since(&self, _since: Option<&str>) -> Result<Vec<CommitInfo>> {
            Ok(self.commits.clone())
        }

        fn latest_tag(&self, _prefix: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct BrokenSource;

    impl CommitSource for BrokenSource {
        fn commits_since(&self, _since: Option<&str>) -> Result<Vec<CommitInfo>> {
            Err(ChangelogError::HistoryUnavailable("no repo".to_string()))
        }

        fn latest_tag(&self, _prefix: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn test_groups_in_taxonomy_order_with_other_last() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let commits = vec![
            make_commit("fix: crash on launch", "Ana"),
            make_commit("Update README", "Bo"),
            make_commit("feat: add dark mode", "Ana"),
            make_commit("wip(ui): sketch", "Bo"),
        ];

        let entry = generator.generate("1.0.0", &commits, None);
        let titles: Vec<_> = entry.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Features", "Bug Fixes", "Other"]);
        assert_eq!(entry.sections[2].commits.len(), 2);
        assert_eq!(entry.notes.contributors, vec!["Ana", "Bo"]);
    }

    #[test]
    fn test_hidden_types_are_not_rendered_but_counted() {
        let mut config = ChangelogConfig::default();
        config.types.insert(
            "chore".to_string(),
            CommitTypeConfig {
                title: "Chores".to_string(),
                emoji: None,
                hidden: true,
            },
        );
        let generator = ChangelogGenerator::new(config);

        let entry = generator.generate(
            "1.0.0",
            &[make_commit("chore: bump deps", "Ana")],
            None,
        );
        assert!(entry.sections.is_empty());
        assert_eq!(entry.stats.by_type.get("chore"), Some(&1));
    }

    #[test]
    fn test_manual_notes_are_merged_not_replaced() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let manual = ReleaseNotes {
            highlights: vec!["Brand new look".to_string()],
            breaking_changes: vec!["Minimum iOS is now 15".to_string()],
            contributors: vec!["Design Team".to_string()],
        };
        let commits = vec![
            make_commit("feat(api)!: remove v1 endpoints", "Ana"),
            make_commit("fix: login", "Ana"),
        ];

        let entry = generator.generate("2.0.0", &commits, Some(&manual));
        assert_eq!(entry.notes.highlights, vec!["Brand new look"]);
        assert_eq!(
            entry.notes.breaking_changes,
            vec!["Minimum iOS is now 15", "api: remove v1 endpoints"]
        );
        assert_eq!(entry.notes.contributors, vec!["Design Team", "Ana"]);
        assert_eq!(entry.stats.breaking, 1);
    }

    #[test]
    fn test_recommended_bump() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let fix = make_commit("fix: typo", "Ana");
        let feat = make_commit("feat(ui): new onboarding", "Ana");
        let breaking = make_commit("refactor!: drop Android 7", "Bo");

        assert_eq!(generator.recommended_bump(&[]), BumpLevel::Patch);
        assert_eq!(generator.recommended_bump(&[fix.clone()]), BumpLevel::Patch);
        assert_eq!(
            generator.recommended_bump(&[fix.clone(), feat.clone()]),
            BumpLevel::Minor
        );
        assert_eq!(
            generator.recommended_bump(&[fix, feat, breaking]),
            BumpLevel::Major
        );
    }

    #[test]
    fn test_stats() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let commits = vec![
            make_commit("feat: one", "Ana"),
            make_commit("feat: two", "Bo"),
            make_commit("random", "Bo"),
        ];
        let stats = generator.generate("1.0.0", &commits, None).stats;
        assert_eq!(stats.commits, 3);
        assert_eq!(stats.contributors, 2);
        assert_eq!(stats.by_type.get("feat"), Some(&2));
        assert_eq!(stats.by_type.get("other"), Some(&1));
    }

    #[test]
    fn test_generate_from_source() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let source = FakeSource {
            commits: vec![make_commit("perf: faster startup", "Ana")],
        };
        let entry = generator
            .generate_from(&source, "1.2.0", Some("v1.1.0"), None)
            .unwrap();
        assert_eq!(entry.sections[0].title, "Performance");

        assert!(generator
            .generate_from(&BrokenSource, "1.2.0", None, None)
            .is_err());
    }
}
