//! Commit type taxonomy

use std::collections::HashMap;

use launchpad_core::config::CommitTypeConfig;
use serde::{Deserialize, Serialize};

/// Title of the bucket for commits whose type is not in the taxonomy
pub const OTHER_TITLE: &str = "Other";

/// One entry of the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitType {
    /// Type key as written in the commit header
    pub key: String,
    /// Section title
    pub title: String,
    /// Optional emoji
    pub emoji: Option<String>,
    /// Excluded from rendered sections
    pub hidden: bool,
}

impl CommitType {
    fn new(key: &str, title: &str, emoji: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            emoji: Some(emoji.to_string()),
            hidden: false,
        }
    }
}

/// Ordered set of known commit types
#[derive(Debug, Clone)]
pub struct CommitTaxonomy {
    types: Vec<CommitType>,
}

impl CommitTaxonomy {
    /// Built-in types, in rendering order
    pub fn defaults() -> Self {
        Self {
            types: vec![
                CommitType::new("feat", "Features", "✨"),
                CommitType::new("fix", "Bug Fixes", "🐛"),
                CommitType::new("perf", "Performance", "⚡"),
                CommitType::new("refactor", "Refactoring", "♻️"),
                CommitType::new("docs", "Documentation", "📝"),
                CommitType::new("style", "Styles", "💄"),
                CommitType::new("test", "Tests", "✅"),
                CommitType::new("ci", "CI", "👷"),
                CommitType::new("chore", "Chores", "🔧"),
            ],
        }
    }

    /// Defaults with configured overrides applied.
    ///
    /// Configured keys replace the matching default; unknown keys are appended
    /// in alphabetical order.
    pub fn from_config(types: &HashMap<String, CommitTypeConfig>) -> Self {
        let mut taxonomy = Self::defaults();

        let mut keys: Vec<_> = types.keys().collect();
        keys.sort();
        for key in keys {
            let config = &types[key];
            let entry = CommitType {
                key: key.to_lowercase(),
                title: config.title.clone(),
                emoji: config.emoji.clone(),
                hidden: config.hidden,
            };
            match taxonomy.types.iter_mut().find(|t| t.key == entry.key) {
                Some(existing) => *existing = entry,
                None => taxonomy.types.push(entry),
            }
        }

        taxonomy
    }

    /// Look up a type by key
    pub fn get(&self, key: &str) -> Option<&CommitType> {
        self.types.iter().find(|t| t.key == key)
    }

    /// Types in rendering order
    pub fn types(&self) -> &[CommitType] {
        &self.types
    }
}

impl Default for CommitTaxonomy {
    fn default() -> Self {
        Self::defaults()
    }
}
