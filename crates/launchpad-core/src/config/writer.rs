//! In-place edits of the configuration file

use std::path::Path;

use toml_edit::{value, DocumentMut, Item, Table};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::loader::is_toml;

/// Rewrite `version.current` in a config file, keeping the rest of the file intact.
///
/// Returns `Ok(false)` when the document has a `version` key that is not a section
/// and therefore cannot hold `current`.
pub fn update_config_version(path: &Path, new_version: &str) -> Result<bool> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let updated = if is_toml(path) {
        update_toml(&content, new_version)?
    } else {
        update_yaml(&content, new_version)
    };

    match updated {
        Some(new_content) => {
            std::fs::write(path, new_content).map_err(ConfigError::Io)?;
            info!(path = %path.display(), version = new_version, "config version updated");
            Ok(true)
        }
        None => {
            warn!(path = %path.display(), "config has no usable version section");
            Ok(false)
        }
    }
}

fn update_toml(content: &str, new_version: &str) -> Result<Option<String>> {
    let mut doc: DocumentMut = content.parse().map_err(ConfigError::TomlEditError)?;

    if !doc.contains_key("version") {
        doc.insert("version", Item::Table(Table::new()));
    }

    match doc.get_mut("version").and_then(|v| v.as_table_like_mut()) {
        Some(table) => {
            table.insert("current", value(new_version));
            Ok(Some(doc.to_string()))
        }
        None => Ok(None),
    }
}

/// Line-oriented YAML edit so comments and ordering survive.
fn update_yaml(content: &str, new_version: &str) -> Option<String> {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    let Some(section) = lines.iter().position(|l| l.trim_end() == "version:") else {
        if lines.iter().any(|l| l.starts_with("version:")) {
            return None;
        }
        debug!("appending version section to config");
        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push("version:".to_string());
        lines.push(format!("  current: \"{}\"", new_version));
        return Some(join_lines(&lines, content));
    };

    let mut indent = None;
    for (i, line) in lines.iter().enumerate().skip(section + 1) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let width = line.len() - trimmed.len();
        if width == 0 {
            break;
        }
        if indent.is_none() {
            indent = Some(width);
        }
        if Some(width) == indent && trimmed.starts_with("current:") {
            let quote = if trimmed.contains('"') { "\"" } else { "" };
            lines[i] = format!(
                "{}current: {}{}{}",
                " ".repeat(width),
                quote,
                new_version,
                quote
            );
            return Some(join_lines(&lines, content));
        }
    }

    let width = indent.unwrap_or(2);
    lines.insert(
        section + 1,
        format!("{}current: \"{}\"", " ".repeat(width), new_version),
    );
    Some(join_lines(&lines, content))
}

fn join_lines(lines: &[String], original: &str) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') || original.is_empty() {
        out.push('\n');
    }
    out
}
