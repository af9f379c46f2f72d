//! Launchpad Git - commit history and tags for release automation
//!
//! This crate reads commit history for changelog generation, finds version
//! tags, and creates the tags that mark version backups.

mod commits;
mod error;
mod repository;
mod tagger;
mod tags;
pub mod types;

pub use error::GitError;
pub use repository::{GitRepo, Result};
pub use tagger::GitTagger;
pub use types::{CommitInfo, TagInfo};
