//! Version backups
//!
//! A backup is a timestamped directory holding copies of every file a version
//! bump may touch, plus a `manifest.json` mapping each copy back to its origin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::updater::resolve_files;
use crate::error::{Result, VersionError};

const MANIFEST_FILE: &str = "manifest.json";

/// Outcome of a backup attempt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupResult {
    /// Whether the backup was written
    pub success: bool,
    /// Backup directory
    pub location: Option<PathBuf>,
    /// Original paths that were copied
    pub files: Vec<PathBuf>,
    /// Name of the git tag marking the backup, when one was created
    pub tag: Option<String>,
    /// Failure reason
    pub error: Option<String>,
}

impl BackupResult {
    /// A failed backup
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Whether a git tag was created alongside the backup
    pub fn tag_created(&self) -> bool {
        self.tag.is_some()
    }
}

/// Record of one backup, stored as `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Version that was current when the backup was taken
    pub version: String,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
    /// Copied files
    pub files: Vec<BackupEntry>,
}

/// One copied file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Absolute path of the original file
    pub original: PathBuf,
    /// Path of the copy, relative to the backup directory
    pub stored: PathBuf,
}

/// Snapshot and restore of version-bearing files
pub trait VersionBackup: Send + Sync {
    /// Snapshot the current state before moving away from `from_version`
    fn create_backup(&self, from_version: &str) -> BackupResult;

    /// Copy a backup's files back to where they came from
    fn restore_backup(&self, backup: &Path) -> Result<Vec<PathBuf>>;

    /// Backups available for restore, newest first
    fn list_backups(&self) -> Result<Vec<PathBuf>>;
}

/// Marks a backup with a version-control tag
pub trait BackupTagger: Send + Sync {
    /// Create a tag named `name` at the current head
    fn tag_backup(&self, name: &str, message: &str) -> Result<()>;
}

/// Filesystem backup under a configured directory
pub struct FileVersionBackup {
    base_dir: PathBuf,
    backup_dir: PathBuf,
    config_path: Option<PathBuf>,
    patterns: Vec<String>,
    tagger: Option<Arc<dyn BackupTagger>>,
}

impl FileVersionBackup {
    /// Create a backup store. Relative `backup_dir` is resolved against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, backup_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.into();
        let backup_dir = base_dir.join(backup_dir.as_ref());
        Self {
            base_dir,
            backup_dir,
            config_path: None,
            patterns: Vec::new(),
            tagger: None,
        }
    }

    /// Include the configuration file in every backup
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Include files matching these patterns
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Tag each backup
    pub fn with_tagger(mut self, tagger: Arc<dyn BackupTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Directory holding the backups
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if let Some(config) = &self.config_path {
            if config.is_file() {
                files.push(config.clone());
            }
        }
        for file in resolve_files(&self.base_dir, &self.patterns)? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        Ok(files)
    }

    fn write_backup(&self, dir: &Path, from_version: &str, files: &[PathBuf]) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut entries = Vec::with_capacity(files.len());
        for (index, original) in files.iter().enumerate() {
            let stored = match original.strip_prefix(&self.base_dir) {
                Ok(rel) => PathBuf::from("files").join(rel),
                Err(_) => {
                    let name = original
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "file".to_string());
                    PathBuf::from("external").join(format!("{}_{}", index, name))
                }
            };

            let target = dir.join(&stored);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(original, &target)?;
            debug!(from = %original.display(), to = %target.display(), "backed up file");

            let original = std::fs::canonicalize(original).unwrap_or_else(|_| original.clone());
            entries.push(BackupEntry { original, stored });
        }

        let manifest = BackupManifest {
            version: from_version.to_string(),
            created_at: Utc::now(),
            files: entries,
        };
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }
}

impl VersionBackup for FileVersionBackup {
    #[instrument(skip(self), fields(backup_dir = %self.backup_dir.display()))]
    fn create_backup(&self, from_version: &str) -> BackupResult {
        let files = match self.collect_files() {
            Ok(files) => files,
            Err(e) => return BackupResult::failed(e.to_string()),
        };

        let timestamp = Utc::now().format("%Y%m%d-%H%M%S%3f").to_string();
        let dir = self.backup_dir.join(format!("{}_v{}", timestamp, from_version));

        if let Err(e) = self.write_backup(&dir, from_version, &files) {
            warn!(error = %e, "backup failed, removing partial copy");
            let _ = std::fs::remove_dir_all(&dir);
            return BackupResult::failed(e.to_string());
        }

        let tag = self.tagger.as_ref().and_then(|tagger| {
            let name = format!("launchpad-backup/{}-{}", from_version, timestamp);
            let message = format!("Backup before moving away from {}", from_version);
            match tagger.tag_backup(&name, &message) {
                Ok(()) => Some(name),
                Err(e) => {
                    warn!(error = %e, "backup written but tagging failed");
                    None
                }
            }
        });

        info!(location = %dir.display(), files = files.len(), "backup created");
        BackupResult {
            success: true,
            location: Some(dir),
            files,
            tag,
            error: None,
        }
    }

    #[instrument(skip(self), fields(backup = %backup.display()))]
    fn restore_backup(&self, backup: &Path) -> Result<Vec<PathBuf>> {
        let dir = if backup.is_absolute() {
            backup.to_path_buf()
        } else if backup.exists() {
            backup.to_path_buf()
        } else {
            self.backup_dir.join(backup)
        };

        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|_| VersionError::BackupNotFound(dir.clone()))?;
        let manifest: BackupManifest = serde_json::from_str(&content)?;

        let mut restored = Vec::with_capacity(manifest.files.len());
        for entry in &manifest.files {
            let source = dir.join(&entry.stored);
            if let Some(parent) = entry.original.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&source, &entry.original).map_err(|e| VersionError::UpdateFailed {
                path: entry.original.clone(),
                reason: e.to_string(),
            })?;
            restored.push(entry.original.clone());
        }

        info!(version = %manifest.version, files = restored.len(), "backup restored");
        Ok(restored)
    }

    fn list_backups(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = std::fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join(MANIFEST_FILE).is_file())
            .collect();

        // Directory names start with a sortable timestamp
        backups.sort();
        backups.reverse();
        Ok(backups)
    }
}

/// Read the manifest of a backup directory
pub fn read_manifest(backup: &Path) -> Result<BackupManifest> {
    let content = std::fs::read_to_string(backup.join(MANIFEST_FILE))
        .map_err(|_| VersionError::BackupNotFound(backup.to_path_buf()))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingTagger {
        names: Mutex<Vec<String>>,
        fail: bool,
    }

    impl BackupTagger for RecordingTagger {
        fn tag_backup(&self, name: &str, _message: &str) -> Result<()> {
            if self.fail {
                return Err(crate::LaunchpadError::other("tag exists"));
            }
            self.names.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            "version:\n  current: 1.0.0\n",
        )
        .unwrap();
        std::fs::create_dir_all(temp.path().join("android/app")).unwrap();
        std::fs::write(
            temp.path().join("android/app/build.gradle"),
            "versionName \"1.0.0\"\n",
        )
        .unwrap();
        temp
    }

    fn backup_for(temp: &TempDir) -> FileVersionBackup {
        FileVersionBackup::new(temp.path(), ".launchpad/backups")
            .with_config_path(temp.path().join("launchpad.yaml"))
            .with_patterns(vec!["android/app/build.gradle".to_string()])
    }

    #[test]
    fn test_backup_and_restore() {
        let temp = project();
        let backup = backup_for(&temp);

        let result = backup.create_backup("1.0.0");
        assert!(result.success);
        assert_eq!(result.files.len(), 2);
        assert!(!result.tag_created());
        let location = result.location.unwrap();
        assert!(location.to_string_lossy().ends_with("_v1.0.0"));

        let manifest = read_manifest(&location).unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.files.len(), 2);

        std::fs::write(temp.path().join("launchpad.yaml"), "version:\n  current: 2.0.0\n").unwrap();
        std::fs::write(
            temp.path().join("android/app/build.gradle"),
            "versionName \"2.0.0\"\n",
        )
        .unwrap();

        let restored = backup.restore_backup(&location).unwrap();
        assert_eq!(restored.len(), 2);
        assert!(std::fs::read_to_string(temp.path().join("launchpad.yaml"))
            .unwrap()
            .contains("1.0.0"));
        assert!(std::fs::read_to_string(temp.path().join("android/app/build.gradle"))
            .unwrap()
            .contains("1.0.0"));
    }

    #[test]
    fn test_list_backups_newest_first() {
        let temp = project();
        let backup = backup_for(&temp);
        assert!(backup.list_backups().unwrap().is_empty());

        let first = backup.create_backup("1.0.0").location.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = backup.create_backup("1.1.0").location.unwrap();

        assert_eq!(backup.list_backups().unwrap(), vec![second, first]);
    }

    #[test]
    fn test_restore_missing_backup() {
        let temp = project();
        let backup = backup_for(&temp);
        let err = backup
            .restore_backup(&temp.path().join("does-not-exist"))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::LaunchpadError::Version(VersionError::BackupNotFound(_))
        ));
    }

    #[test]
    fn test_tagging() {
        let temp = project();
        let tagger = Arc::new(RecordingTagger {
            names: Mutex::new(Vec::new()),
            fail: false,
        });
        let backup = backup_for(&temp).with_tagger(tagger.clone());

        let result = backup.create_backup("1.0.0");
        assert!(result.tag_created());
        let names = tagger.names.lock().unwrap();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("launchpad-backup/1.0.0-"));
    }

    #[test]
    fn test_tag_failure_keeps_backup() {
        let temp = project();
        let backup = backup_for(&temp).with_tagger(Arc::new(RecordingTagger {
            names: Mutex::new(Vec::new()),
            fail: true,
        }));

        let result = backup.create_backup("1.0.0");
        assert!(result.success);
        assert!(!result.tag_created());
    }
}
