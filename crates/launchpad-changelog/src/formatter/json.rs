//! JSON changelog formatter

use launchpad_core::config::ChangelogConfig;
use serde_json::{json, Value};

use super::ChangelogFormatter;
use crate::types::ChangelogEntry;

/// Renders an entry as a JSON document honoring the same toggles as markdown
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ChangelogFormatter for JsonFormatter {
    fn format(&self, entry: &ChangelogEntry, config: &ChangelogConfig) -> String {
        let sections: Vec<Value> = entry
            .sections
            .iter()
            .map(|s| {
                json!({
                    "type": s.key,
                    "title": s.title,
                    "commits": s.commits.iter().map(|c| {
                        let mut item = json!({
                            "message": c.message,
                            "scope": c.scope,
                        });
                        if config.include_hashes {
                            item["hash"] = json!(c.short_hash);
                        }
                        if config.include_authors {
                            item["author"] = json!(c.author);
                        }
                        item
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();

        let mut doc = json!({
            "version": entry.version,
            "date": entry.date.format("%Y-%m-%d").to_string(),
            "highlights": entry.notes.highlights,
            "sections": sections,
        });
        if config.include_breaking_changes {
            doc["breaking_changes"] = json!(entry.notes.breaking_changes);
        }
        if config.include_contributors {
            doc["contributors"] = json!(entry.notes.contributors);
        }
        if config.include_stats {
            doc["stats"] = json!(entry.stats);
        }

        serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
