//! Changelog file operations

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use launchpad_core::ChangelogError;
use tracing::{debug, info};

use crate::Result;

const HEADER: &str = "# Changelog";

/// A changelog document on disk with a single `.bak` backup next to it
#[derive(Debug, Clone)]
pub struct ChangelogFile {
    path: PathBuf,
}

impl ChangelogFile {
    /// Wrap the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the changelog
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup copy, `<path>.bak`
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Read the whole file
    pub fn read(&self) -> Result<String> {
        if !self.path.is_file() {
            return Err(ChangelogError::FileNotFound(self.path.clone()));
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// The section for `version`, from its heading up to the next version heading
    pub fn section(&self, version: &str) -> Result<String> {
        let content = self.read()?;
        let lines: Vec<&str> = content.lines().collect();
        let (start, end) = find_section(&lines, version)
            .ok_or_else(|| ChangelogError::VersionNotFound(version.to_string()))?;
        Ok(lines[start..end].join("\n").trim_end().to_string())
    }

    /// Copy the current file to the backup path. Returns `None` when there is nothing to back up.
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let backup = self.backup_path();
        std::fs::copy(&self.path, &backup)?;
        debug!(backup = %backup.display(), "changelog backed up");
        Ok(Some(backup))
    }

    /// Put the backup back in place
    pub fn restore(&self) -> Result<()> {
        let backup = self.backup_path();
        if !backup.is_file() {
            return Err(ChangelogError::BackupNotFound(backup));
        }
        std::fs::copy(&backup, &self.path)?;
        info!(path = %self.path.display(), "changelog restored from backup");
        Ok(())
    }

    /// Insert a rendered entry above the existing ones, below the document header
    pub fn prepend(&self, rendered: &str) -> Result<()> {
        self.backup()?;
        let existing = if self.path.is_file() {
            std::fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let content = insert_entry(&existing, rendered);
        self.write(&content)
    }

    /// Replace the section of `version` with `rendered`, or prepend it when absent.
    ///
    /// Returns `true` when an existing section was replaced.
    pub fn upsert(&self, version: &str, rendered: &str) -> Result<bool> {
        let existing = if self.path.is_file() {
            std::fs::read_to_string(&self.path)?
        } else {
            String::new()
        };
        let lines: Vec<&str> = existing.lines().collect();

        let Some((start, end)) = find_section(&lines, version) else {
            self.prepend(rendered)?;
            return Ok(false);
        };

        self.backup()?;
        let mut content = String::new();
        for line in &lines[..start] {
            content.push_str(line);
            content.push('\n');
        }
        content.push_str(rendered.trim_end());
        content.push_str("\n\n");
        for line in &lines[end..] {
            content.push_str(line);
            content.push('\n');
        }
        self.write(content.trim_end())?;
        Ok(true)
    }

    /// Replace the whole file, keeping a backup of the previous content
    pub fn replace(&self, content: &str) -> Result<()> {
        self.backup()?;
        self.write(content)
    }

    fn write(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = content.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), "changelog written");
        Ok(())
    }
}

fn is_version_heading(line: &str) -> bool {
    line.starts_with("## ")
}

fn heading_matches(line: &str, version: &str) -> bool {
    let Some(rest) = line.strip_prefix("## ") else {
        return false;
    };
    let rest = rest.trim_start();
    let name = rest
        .strip_prefix('[')
        .and_then(|r| r.split(']').next())
        .unwrap_or_else(|| rest.split_whitespace().next().unwrap_or_default());
    name.trim_start_matches('v') == version.trim_start_matches('v')
}

fn find_section(lines: &[&str], version: &str) -> Option<(usize, usize)> {
    let start = lines.iter().position(|l| heading_matches(l, version))?;
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, l)| is_version_heading(l))
        .map(|(i, _)| i)
        .unwrap_or(lines.len());
    Some((start, end))
}

fn insert_entry(existing: &str, rendered: &str) -> String {
    let rendered = rendered.trim_end();
    if existing.trim().is_empty() {
        return format!("{}\n\n{}\n", HEADER, rendered);
    }

    let lines: Vec<&str> = existing.lines().collect();
    match lines.iter().position(|l| is_version_heading(l)) {
        Some(first) => {
            let head = lines[..first].join("\n");
            let tail = lines[first..].join("\n");
            format!("{}\n\n{}\n\n{}\n", head.trim_end(), rendered, tail.trim_end())
                .trim_start()
                .to_string()
        }
        None => format!("{}\n\n{}\n", existing.trim_end(), rendered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXISTING: &str = "# Changelog\n\nAll notable changes.\n\n## [1.0.0] - 2024-01-01\n\n### Features\n\n- first\n\n## [0.9.0] - 2023-12-01\n\n- beta\n";

    fn setup() -> (TempDir, ChangelogFile) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");
        std::fs::write(&path, EXISTING).unwrap();
        (temp, ChangelogFile::new(path))
    }

    #[test]
    fn test_prepend_keeps_header_and_backs_up() {
        let (_temp, file) = setup();
        file.prepend("## [1.1.0] - 2024-02-01\n\n- second\n").unwrap();

        let content = file.read().unwrap();
        assert!(content.starts_with("# Changelog\n\nAll notable changes.\n\n## [1.1.0]"));
        assert!(content.find("## [1.1.0]").unwrap() < content.find("## [1.0.0]").unwrap());
        assert_eq!(std::fs::read_to_string(file.backup_path()).unwrap(), EXISTING);
    }

    #[test]
    fn test_prepend_to_missing_file() {
        let temp = TempDir::new().unwrap();
        let file = ChangelogFile::new(temp.path().join("docs/CHANGELOG.md"));
        file.prepend("## [0.1.0] - 2024-01-01\n\n- init\n").unwrap();
        assert_eq!(
            file.read().unwrap(),
            "# Changelog\n\n## [0.1.0] - 2024-01-01\n\n- init\n"
        );
        assert!(!file.backup_path().exists());
    }

    #[test]
    fn test_section() {
        let (_temp, file) = setup();
        assert_eq!(
            file.section("1.0.0").unwrap(),
            "## [1.0.0] - 2024-01-01\n\n### Features\n\n- first"
        );
        assert_eq!(file.section("v0.9.0").unwrap(), "## [0.9.0] - 2023-12-01\n\n- beta");
        assert!(matches!(
            file.section("2.0.0"),
            Err(ChangelogError::VersionNotFound(_))
        ));
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let (_temp, file) = setup();
        let replaced = file
            .upsert("1.0.0", "## [1.0.0] - 2024-01-02\n\n- rewritten\n")
            .unwrap();
        assert!(replaced);

        let content = file.read().unwrap();
        assert!(content.contains("- rewritten"));
        assert!(!content.contains("- first"));
        assert!(content.contains("## [0.9.0]"));
        assert!(content.find("## [1.0.0]").unwrap() < content.find("## [0.9.0]").unwrap());
    }

    #[test]
    fn test_upsert_prepends_when_missing() {
        let (_temp, file) = setup();
        assert!(!file.upsert("2.0.0", "## [2.0.0] - 2024-03-01\n\n- new\n").unwrap());
        assert!(file.read().unwrap().contains("## [2.0.0]"));
    }

    #[test]
    fn test_restore() {
        let (_temp, file) = setup();
        assert!(matches!(file.restore(), Err(ChangelogError::BackupNotFound(_))));

        file.prepend("## [1.1.0] - 2024-02-01\n").unwrap();
        file.restore().unwrap();
        assert_eq!(file.read().unwrap(), EXISTING);
    }
}
