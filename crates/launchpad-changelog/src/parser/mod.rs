//! Commit parsing

mod conventional;

pub use conventional::ConventionalParser;
