//! Launchpad Changelog - changelog generation from conventional commits
//!
//! Commits are read through a [`CommitSource`], classified against a
//! [`CommitTaxonomy`], merged with any hand-written [`ReleaseNotes`] and
//! rendered as markdown or JSON.

pub mod file;
pub mod formatter;
pub mod generator;
pub mod parser;
pub mod release_notes;
pub mod source;
pub mod taxonomy;
pub mod types;

pub use file::ChangelogFile;
pub use formatter::{formatter_for, ChangelogFormatter, JsonFormatter, MarkdownFormatter};
pub use generator::ChangelogGenerator;
pub use parser::ConventionalParser;
pub use release_notes::ReleaseNotesStore;
pub use source::CommitSource;
pub use taxonomy::{CommitTaxonomy, CommitType};
pub use types::{ChangelogEntry, ChangelogStats, GitCommit, ReleaseNotes, Section};

/// Result type for changelog operations
pub type Result<T> = std::result::Result<T, launchpad_core::ChangelogError>;
