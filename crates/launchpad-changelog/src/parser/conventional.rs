//! Conventional Commits parser
//!
//! Parses commits following the Conventional Commits format:
//! https://www.conventionalcommits.org/
//!
//! A commit is breaking when its header carries `!` right before the colon
//! (`feat!:`, `feat(api)!:`) or its body has a `BREAKING CHANGE:` or
//! `BREAKING-CHANGE:` footer, in any case. Nothing else marks a commit as
//! breaking.
//!
//! Footers are only read from the last paragraph of the body, and only when
//! that paragraph opens with a `Token: value` line.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{Footer, GitCommit};
use launchpad_git::CommitInfo;

/// Regex for parsing conventional commit headers
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("Invalid regex")
});

/// Regex for parsing footer lines
static FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<token>(?i:breaking change)|[A-Za-z-]+): (?P<value>.+)$")
        .expect("Invalid regex")
});

/// Parser for Conventional Commits format
#[derive(Debug, Clone, Default)]
pub struct ConventionalParser {
    include_merges: bool,
}

impl ConventionalParser {
    /// Create a parser that skips merge commits
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep merge commits instead of skipping them
    pub fn with_merges(mut self, include: bool) -> Self {
        self.include_merges = include;
        self
    }

    /// Classify a commit. Returns `None` only for merge commits that are skipped.
    ///
    /// Headers that do not follow the convention are kept with no type.
    pub fn parse(&self, commit: &CommitInfo) -> Option<GitCommit> {
        if !self.include_merges && (commit.is_merge || commit.message.starts_with("Merge ")) {
            return None;
        }

        let (body, footers) = match commit.body.as_deref() {
            Some(body) => parse_body(body),
            None => (None, Vec::new()),
        };
        let breaking_in_footer = footers.iter().any(Footer::is_breaking);

        let header = commit.message.trim();
        let (commit_type, scope, breaking_marker, message) = match CONVENTIONAL_REGEX.captures(header)
        {
            Some(caps) => (
                caps.name("type").map(|m| m.as_str().to_lowercase()),
                caps.name("scope").map(|m| m.as_str().to_string()),
                caps.name("breaking").is_some(),
                caps.name("description")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            ),
            None => (None, None, false, header.to_string()),
        };

        Some(GitCommit {
            hash: commit.hash.clone(),
            short_hash: commit.short_hash.clone(),
            commit_type,
            scope,
            message,
            body,
            footers,
            author: Some(commit.author.clone()).filter(|a| !a.is_empty()),
            date: Some(commit.timestamp),
            breaking: breaking_marker || breaking_in_footer,
        })
    }
}

/// Split a body into free text and the trailing footer paragraph
fn parse_body(body: &str) -> (Option<String>, Vec<Footer>) {
    let lines: Vec<&str> = body.trim_end().lines().collect();

    // The last paragraph starts after the last blank line
    let start = lines
        .iter()
        .rposition(|line| line.trim().is_empty())
        .map_or(0, |i| i + 1);
    let opens_footer = lines
        .get(start)
        .is_some_and(|line| FOOTER_REGEX.is_match(line));

    let (text_lines, footer_lines) = if opens_footer {
        lines.split_at(start)
    } else {
        (&lines[..], &[][..])
    };

    let mut footers: Vec<Footer> = Vec::new();
    for line in footer_lines {
        match FOOTER_REGEX.captures(line) {
            Some(caps) => footers.push(Footer {
                token: caps["token"].to_string(),
                value: caps["value"].to_string(),
            }),
            // Continuation of the previous footer
            None => {
                if let Some(last) = footers.last_mut() {
                    last.value.push('\n');
                    last.value.push_str(line.trim());
                }
            }
        }
    }

    let text = text_lines.join("\n").trim().to_string();
    let body_text = if text.is_empty() { None } else { Some(text) };

    (body_text, footers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_commit(message: &str) -> CommitInfo {
        CommitInfo::new(
            "abc1234567890",
            message,
            "Test Author",
            "test@example.com",
            Utc::now(),
        )
    }

    #[test]
    fn test_parse_simple_feat() {
        let parsed = ConventionalParser::new()
            .parse(&make_commit("feat: add new feature"))
            .unwrap();

        assert_eq!(parsed.commit_type.as_deref(), Some("feat"));
        assert_eq!(parsed.message, "add new feature");
        assert_eq!(parsed.short_hash, "abc1234");
        assert!(parsed.scope.is_none());
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_parse_with_scope() {
        let parsed = ConventionalParser::new()
            .parse(&make_commit("Fix(parser): handle edge case"))
            .unwrap();

        assert_eq!(parsed.commit_type.as_deref(), Some("fix"));
        assert_eq!(parsed.scope.as_deref(), Some("parser"));
        assert_eq!(parsed.message, "handle edge case");
    }

    #[test]
    fn test_parse_breaking_marker() {
        let parser = ConventionalParser::new();
        assert!(parser.parse(&make_commit("feat!: drop v1 api")).unwrap().breaking);

        let scoped = parser
            .parse(&make_commit("refactor(core)!: major refactoring"))
            .unwrap();
        assert_eq!(scoped.scope.as_deref(), Some("core"));
        assert!(scoped.breaking);
    }

    #[test]
    fn test_breaking_footer_variants() {
        let parser = ConventionalParser::new();
        for footer in ["BREAKING CHANGE: config moved", "BREAKING-CHANGE: config moved"] {
            let commit = make_commit("feat: add feature").with_body(footer);
            assert!(parser.parse(&commit).unwrap().breaking, "{}", footer);
        }

        let commit = make_commit("fix: typo").with_body("This is a breaking change for nobody");
        assert!(!parser.parse(&commit).unwrap().breaking);

        let commit = make_commit("feat: add feature").with_body("Breaking change: config moved");
        let parsed = parser.parse(&commit).unwrap();
        assert!(parsed.breaking);
        assert_eq!(parsed.footers[0].token, "Breaking change");
    }

    #[test]
    fn test_colon_lines_in_prose_stay_in_body() {
        let commit = make_commit("fix: retry uploads").with_body(
            "Note: see below\nThe client now retries twice.\n\nTimeouts: are doubled each time\nwhich keeps slow links alive.\n\nRefs: #88",
        );

        let parsed = ConventionalParser::new().parse(&commit).unwrap();
        assert_eq!(
            parsed.body.as_deref(),
            Some("Note: see below\nThe client now retries twice.\n\nTimeouts: are doubled each time\nwhich keeps slow links alive.")
        );
        assert_eq!(parsed.footers.len(), 1);
        assert_eq!(parsed.footers[0].token, "Refs");
        assert_eq!(parsed.footers[0].value, "#88");
    }

    #[test]
    fn test_breaking_footer_only_counts_in_footer_paragraph() {
        let commit = make_commit("docs: explain migration")
            .with_body("BREAKING CHANGE: is how we label removals.\n\nThis commit only documents it.");
        let parsed = ConventionalParser::new().parse(&commit).unwrap();
        assert!(!parsed.breaking);
        assert!(parsed.footers.is_empty());
    }

    #[test]
    fn test_non_conventional_is_kept_untyped() {
        let parsed = ConventionalParser::new()
            .parse(&make_commit("Just a regular commit message"))
            .unwrap();

        assert!(parsed.commit_type.is_none());
        assert_eq!(parsed.message, "Just a regular commit message");
    }

    #[test]
    fn test_merges_skipped_unless_enabled() {
        let merge = make_commit("Merge branch 'main' into feature").with_merge(true);
        assert!(ConventionalParser::new().parse(&merge).is_none());
        assert!(ConventionalParser::new()
            .with_merges(true)
            .parse(&merge)
            .is_some());
    }

    #[test]
    fn test_parse_with_footer() {
        let commit = make_commit("feat: add feature")
            .with_body("Body text\n\nRefs: #123\nFixes: #456\n  and #457");

        let parsed = ConventionalParser::new().parse(&commit).unwrap();
        assert_eq!(parsed.body.as_deref(), Some("Body text"));
        assert_eq!(parsed.footers.len(), 2);
        assert_eq!(parsed.footers[0].token, "Refs");
        assert_eq!(parsed.footers[0].value, "#123");
        assert_eq!(parsed.footers[1].value, "#456\nand #457");
    }
}
