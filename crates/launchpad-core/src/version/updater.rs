//! Rewriting version strings inside project files

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::config::update_config_version;
use crate::error::{LaunchpadError, Result, VersionError};

static GRADLE_VERSION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(versionName\s*=?\s*)(["'])[^"']*(["'])"#).expect("Invalid regex")
});
static GRADLE_VERSION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(versionCode\s*=?\s*)(\d+)").expect("Invalid regex"));
static PLIST_SHORT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<key>CFBundleShortVersionString</key>\s*<string>)([^<]*)(</string>)")
        .expect("Invalid regex")
});
static PLIST_BUNDLE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<key>CFBundleVersion</key>\s*<string>)(\d+)(</string>)").expect("Invalid regex")
});
static PBX_MARKETING_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(MARKETING_VERSION = )([^;]+)(;)").expect("Invalid regex"));
static PBX_PROJECT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(CURRENT_PROJECT_VERSION = )(\d+)(;)").expect("Invalid regex")
});
static PUBSPEC_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(version:\s*)([^\s+#]+)(?:\+(\d+))?").expect("Invalid regex")
});
static PACKAGE_JSON_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("version"\s*:\s*")([^"]*)(")"#).expect("Invalid regex")
});

/// Files rewritten by one pass, and the error that stopped it if any.
///
/// `updated` lists every file already written before the failure.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub updated: Vec<PathBuf>,
    pub error: Option<LaunchpadError>,
}

impl RewriteOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Rewrites version strings in project files and in the configuration file
pub trait FileUpdater: Send + Sync {
    /// Rewrite every file matched by `files`, stopping at the first failure
    fn update_version_in_files(
        &self,
        old_version: &str,
        new_version: &str,
        files: &[String],
        increment_version_code: bool,
    ) -> RewriteOutcome;

    /// Persist the new version into the configuration file
    fn update_config(&self, config_path: &Path, new_version: &str) -> Result<bool>;
}

/// Updater for Gradle, Xcode, Flutter and npm project files.
///
/// Files it does not recognise get a literal replacement of the old version.
#[derive(Debug, Clone)]
pub struct ProjectFileUpdater {
    base_dir: PathBuf,
}

impl ProjectFileUpdater {
    /// Create an updater resolving patterns relative to `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Rewrite one file, returning whether its content changed
    fn rewrite_file(
        &self,
        path: &Path,
        old_version: &str,
        new_version: &str,
        increment: bool,
    ) -> Result<bool> {
        let failed = |e: std::io::Error| VersionError::UpdateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let content = std::fs::read_to_string(path).map_err(failed)?;
        let rewritten = self.rewrite(path, &content, old_version, new_version, increment);
        if rewritten == content {
            return Ok(false);
        }
        std::fs::write(path, rewritten).map_err(failed)?;
        Ok(true)
    }

    fn rewrite(
        &self,
        path: &Path,
        content: &str,
        old_version: &str,
        new_version: &str,
        increment: bool,
    ) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if name.ends_with(".gradle") || name.ends_with(".gradle.kts") {
            rewrite_gradle(content, new_version, increment)
        } else if name == "Info.plist" {
            rewrite_plist(content, new_version, increment)
        } else if name == "project.pbxproj" {
            rewrite_pbxproj(content, new_version, increment)
        } else if name == "pubspec.yaml" {
            rewrite_pubspec(content, new_version, increment)
        } else if name == "package.json" {
            PACKAGE_JSON_VERSION
                .replacen(content, 1, |c: &Captures| {
                    format!("{}{}{}", &c[1], new_version, &c[3])
                })
                .into_owned()
        } else {
            replace_literal(content, old_version, new_version)
        }
    }
}

impl FileUpdater for ProjectFileUpdater {
    fn update_version_in_files(
        &self,
        old_version: &str,
        new_version: &str,
        files: &[String],
        increment_version_code: bool,
    ) -> RewriteOutcome {
        let mut outcome = RewriteOutcome::default();

        let paths = match resolve_files(&self.base_dir, files) {
            Ok(paths) => paths,
            Err(e) => {
                outcome.error = Some(e);
                return outcome;
            }
        };

        for path in paths {
            match self.rewrite_file(&path, old_version, new_version, increment_version_code) {
                Ok(true) => {
                    info!(path = %path.display(), version = new_version, "updated version");
                    outcome.updated.push(path);
                }
                Ok(false) => debug!(path = %path.display(), "no version string to rewrite"),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        already_updated = outcome.updated.len(),
                        "rewrite stopped"
                    );
                    outcome.error = Some(e);
                    break;
                }
            }
        }

        outcome
    }

    fn update_config(&self, config_path: &Path, new_version: &str) -> Result<bool> {
        update_config_version(config_path, new_version)
    }
}

/// Expand `patterns` relative to `base_dir` into existing files, deduplicated in order
pub fn resolve_files(base_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let expanded = shellexpand::tilde(pattern);
        let full = if Path::new(expanded.as_ref()).is_absolute() {
            PathBuf::from(expanded.as_ref())
        } else {
            base_dir.join(expanded.as_ref())
        };
        let full = full.to_string_lossy().to_string();

        let entries = glob::glob(&full).map_err(|e| VersionError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        let mut matched = false;
        for entry in entries.flatten() {
            if entry.is_file() {
                matched = true;
                if !files.contains(&entry) {
                    files.push(entry);
                }
            }
        }
        if !matched {
            warn!(pattern = %pattern, "pattern matched no files");
        }
    }

    Ok(files)
}

/// Replace whole occurrences of `old`: `1.0.0` does not match inside
/// `11.0.0` or `1.0.0.5`, but a sentence-ending `1.0.0.` still does
fn replace_literal(content: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for (start, _) in content.match_indices(old) {
        let end = start + old.len();
        if start < last || !is_version_boundary(content, start, end) {
            continue;
        }
        out.push_str(&content[last..start]);
        out.push_str(new);
        last = end;
    }
    out.push_str(&content[last..]);
    out
}

fn is_version_boundary(content: &str, start: usize, end: usize) -> bool {
    let before = content[..start].chars().next_back();
    if matches!(before, Some(c) if c.is_ascii_digit() || c == '.') {
        return false;
    }

    let mut after = content[end..].chars();
    match after.next() {
        Some(c) if c.is_ascii_digit() => false,
        Some('.') => !matches!(after.next(), Some(c) if c.is_ascii_digit()),
        _ => true,
    }
}

fn bump_number(value: &str, increment: bool) -> String {
    match value.parse::<u64>() {
        Ok(n) if increment => n.saturating_add(1).to_string(),
        _ => value.to_string(),
    }
}

fn rewrite_gradle(content: &str, new_version: &str, increment: bool) -> String {
    let out = GRADLE_VERSION_NAME.replace_all(content, |c: &Captures| {
        format!("{}{}{}{}", &c[1], &c[2], new_version, &c[3])
    });
    if !increment {
        return out.into_owned();
    }
    GRADLE_VERSION_CODE
        .replace_all(&out, |c: &Captures| {
            format!("{}{}", &c[1], bump_number(&c[2], true))
        })
        .into_owned()
}

fn rewrite_plist(content: &str, new_version: &str, increment: bool) -> String {
    // Build-setting references such as $(MARKETING_VERSION) are left for pbxproj
    let out = PLIST_SHORT_VERSION.replace_all(content, |c: &Captures| {
        if c[2].starts_with("$(") {
            c[0].to_string()
        } else {
            format!("{}{}{}", &c[1], new_version, &c[3])
        }
    });
    PLIST_BUNDLE_VERSION
        .replace_all(&out, |c: &Captures| {
            format!("{}{}{}", &c[1], bump_number(&c[2], increment), &c[3])
        })
        .into_owned()
}

fn rewrite_pbxproj(content: &str, new_version: &str, increment: bool) -> String {
    let out = PBX_MARKETING_VERSION.replace_all(content, |c: &Captures| {
        format!("{}{}{}", &c[1], new_version, &c[3])
    });
    PBX_PROJECT_VERSION
        .replace_all(&out, |c: &Captures| {
            format!("{}{}{}", &c[1], bump_number(&c[2], increment), &c[3])
        })
        .into_owned()
}

fn rewrite_pubspec(content: &str, new_version: &str, increment: bool) -> String {
    PUBSPEC_VERSION
        .replacen(content, 1, |c: &Captures| match c.get(3) {
            Some(build) => format!(
                "{}{}+{}",
                &c[1],
                new_version,
                bump_number(build.as_str(), increment)
            ),
            None => format!("{}{}", &c[1], new_version),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_gradle_kotlin_dsl() {
        let out = rewrite_gradle(
            "defaultConfig {\n    versionCode = 41\n    versionName = \"1.2.3\"\n}\n",
            "1.3.0",
            true,
        );
        assert!(out.contains("versionName = \"1.3.0\""));
        assert!(out.contains("versionCode = 42"));
    }

    #[test]
    fn test_gradle_groovy_without_code_increment() {
        let out = rewrite_gradle("versionCode 15\nversionName '2.0.0'\n", "2.0.1", false);
        assert!(out.contains("versionName '2.0.1'"));
        assert!(out.contains("versionCode 15"));
    }

    #[test]
    fn test_plist_skips_build_setting_reference() {
        let plist = "<key>CFBundleShortVersionString</key>\n<string>$(MARKETING_VERSION)</string>\n<key>CFBundleVersion</key>\n<string>7</string>";
        let out = rewrite_plist(plist, "1.1.0", true);
        assert!(out.contains("$(MARKETING_VERSION)"));
        assert!(out.contains("<string>8</string>"));

        let literal = "<key>CFBundleShortVersionString</key>\n\t<string>1.0.0</string>";
        assert!(rewrite_plist(literal, "1.1.0", false).contains("<string>1.1.0</string>"));
    }

    #[test]
    fn test_pbxproj() {
        let pbx = "MARKETING_VERSION = 1.0.0;\nCURRENT_PROJECT_VERSION = 3;\nMARKETING_VERSION = 1.0.0;\n";
        let out = rewrite_pbxproj(pbx, "1.0.1", true);
        assert_eq!(out.matches("MARKETING_VERSION = 1.0.1;").count(), 2);
        assert!(out.contains("CURRENT_PROJECT_VERSION = 4;"));
    }

    #[test]
    fn test_pubspec_keeps_build_number() {
        let out = rewrite_pubspec("name: app\nversion: 1.2.3+9\n", "1.3.0", false);
        assert!(out.contains("version: 1.3.0+9"));
        let out = rewrite_pubspec("version: 1.2.3+9\n", "1.3.0", true);
        assert!(out.contains("version: 1.3.0+10"));
    }

    #[test]
    fn test_build_number_at_max_does_not_overflow() {
        let max = u64::MAX.to_string();
        assert_eq!(bump_number(&max, true), max);
    }

    #[test]
    fn test_literal_replacement_matches_whole_versions() {
        let content = "current 1.0.0\nold 11.0.0 and 1.0.0.5 and 21.0.0\nsee v1.0.0.\n";
        assert_eq!(
            replace_literal(content, "1.0.0", "1.0.1"),
            "current 1.0.1\nold 11.0.0 and 1.0.0.5 and 21.0.0\nsee v1.0.1.\n"
        );
        assert_eq!(replace_literal("1.0.0,1.0.0", "1.0.0", "2.0.0"), "2.0.0,2.0.0");
        assert_eq!(replace_literal("1.0.00", "1.0.0", "2.0.0"), "1.0.00");
    }

    #[test]
    fn test_update_files_by_pattern() {
        let temp = TempDir::new().unwrap();
        let gradle = write(
            temp.path(),
            "android/app/build.gradle",
            "versionName \"1.0.0\"\nversionCode 1\n",
        );
        let notes = write(temp.path(), "docs/VERSION.txt", "current 1.0.0\n");
        write(temp.path(), "docs/other.txt", "nothing here\n");

        let updater = ProjectFileUpdater::new(temp.path());
        let outcome = updater.update_version_in_files(
            "1.0.0",
            "1.1.0",
            &["android/app/*.gradle".to_string(), "docs/*.txt".to_string()],
            true,
        );

        assert!(outcome.success(), "{:?}", outcome.error);
        assert_eq!(outcome.updated, vec![gradle.clone(), notes.clone()]);
        let gradle_content = std::fs::read_to_string(&gradle).unwrap();
        assert!(gradle_content.contains("versionName \"1.1.0\""));
        assert!(gradle_content.contains("versionCode 2"));
        assert_eq!(std::fs::read_to_string(&notes).unwrap(), "current 1.1.0\n");
    }

    #[test]
    fn test_failure_keeps_files_already_rewritten() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "a.txt", "v 1.0.0\n");
        std::fs::write(temp.path().join("b.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let outcome = ProjectFileUpdater::new(temp.path()).update_version_in_files(
            "1.0.0",
            "1.0.1",
            &["a.txt".to_string(), "b.txt".to_string()],
            false,
        );

        assert!(!outcome.success());
        assert!(outcome.error.unwrap().to_string().contains("b.txt"));
        assert_eq!(outcome.updated, vec![good.clone()]);
        assert_eq!(std::fs::read_to_string(&good).unwrap(), "v 1.0.1\n");
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_files(temp.path(), &["[".to_string()]).is_err());

        let outcome = ProjectFileUpdater::new(temp.path()).update_version_in_files(
            "1.0.0",
            "1.0.1",
            &["[".to_string()],
            false,
        );
        assert!(!outcome.success());
        assert!(outcome.updated.is_empty());
    }

    #[test]
    fn test_resolve_files_deduplicates() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "package.json", "{\"version\": \"0.1.0\"}");
        let files = resolve_files(
            temp.path(),
            &["package.json".to_string(), "*.json".to_string()],
        )
        .unwrap();
        assert_eq!(files, vec![file]);
    }
}
