//! Changelog formatters

mod json;
mod markdown;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;

use launchpad_core::config::{ChangelogConfig, ChangelogFormat};

use crate::types::ChangelogEntry;

/// Trait for changelog formatters
pub trait ChangelogFormatter: Send + Sync {
    /// Format a changelog entry to string
    fn format(&self, entry: &ChangelogEntry, config: &ChangelogConfig) -> String;

    /// Get the file extension for this format
    fn extension(&self) -> &'static str;
}

/// Formatter for a configured format
pub fn formatter_for(format: ChangelogFormat) -> Box<dyn ChangelogFormatter> {
    match format {
        ChangelogFormat::Markdown => Box::new(MarkdownFormatter::new()),
        ChangelogFormat::Json => Box::new(JsonFormatter),
    }
}
