//! Version bump orchestration
//!
//! A bump moves through fixed stages. The backup always completes before any
//! file is touched, and a failed backup stops the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use super::backup::{BackupResult, VersionBackup};
use super::semantic::SemanticVersion;
use super::updater::FileUpdater;
use crate::config::Config;
use crate::error::Result;
use crate::types::BumpLevel;

/// Stage a bump reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpStage {
    /// Computing the new version
    Validate,
    /// Snapshotting files
    Backup,
    /// Rewriting project files
    Rewrite,
    /// Persisting the version into the configuration file
    UpdateConfig,
    /// Finished
    Done,
}

/// Parameters of a bump
#[derive(Debug, Clone)]
pub struct BumpRequest {
    /// Level to bump by
    pub level: BumpLevel,
    /// Compute only, change nothing
    pub dry_run: bool,
    /// Skip the backup stage
    pub skip_backup: bool,
    /// Also increment numeric build codes (versionCode, CFBundleVersion)
    pub increment_build_number: bool,
}

impl BumpRequest {
    /// A request for `level` with backups and no build number increment
    pub fn new(level: BumpLevel) -> Self {
        Self {
            level,
            dry_run: false,
            skip_backup: false,
            increment_build_number: false,
        }
    }

    /// Set dry run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set skip backup
    pub fn with_skip_backup(mut self, skip: bool) -> Self {
        self.skip_backup = skip;
        self
    }

    /// Set build number increment
    pub fn with_increment_build_number(mut self, increment: bool) -> Self {
        self.increment_build_number = increment;
        self
    }
}

/// Outcome of a bump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionBumpResult {
    /// Version before the bump
    pub previous_version: String,
    /// Version after the bump; equals `previous_version` on failure
    pub new_version: String,
    /// Files rewritten
    pub files_updated: Vec<PathBuf>,
    /// Backup outcome, when a backup was attempted
    pub backup: Option<BackupResult>,
    /// Whether every stage succeeded
    pub success: bool,
    /// Failure reason
    pub error: Option<String>,
    /// Last stage reached
    pub stage: BumpStage,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl VersionBumpResult {
    fn failed(previous: &str, stage: BumpStage, error: impl Into<String>) -> Self {
        Self {
            previous_version: previous.to_string(),
            new_version: previous.to_string(),
            files_updated: Vec::new(),
            backup: None,
            success: false,
            error: Some(error.into()),
            stage,
            dry_run: false,
        }
    }
}

/// Runs version bumps through a backup store and a file updater
pub struct VersionOrchestrator {
    backup: Arc<dyn VersionBackup>,
    updater: Arc<dyn FileUpdater>,
}

impl VersionOrchestrator {
    /// Create an orchestrator
    pub fn new(backup: Arc<dyn VersionBackup>, updater: Arc<dyn FileUpdater>) -> Self {
        Self { backup, updater }
    }

    /// Compute the next version without side effects
    pub fn next_version(config: &Config, level: BumpLevel) -> String {
        SemanticVersion::parse(config.current_version())
            .bump_level(level)
            .to_string()
    }

    /// Bump the configured version.
    ///
    /// Stages: Validate, Backup, Rewrite, UpdateConfig. Any failure yields a
    /// result whose `new_version` equals the previous version.
    #[instrument(skip(self, config), fields(level = %request.level, dry_run = request.dry_run))]
    pub fn bump(
        &self,
        config: &Config,
        config_path: Option<&Path>,
        request: &BumpRequest,
    ) -> VersionBumpResult {
        let previous = config.current_version().to_string();
        let new_version = SemanticVersion::parse(&previous)
            .bump_level(request.level)
            .to_string();
        debug!(previous = %previous, new = %new_version, "validated bump");

        if request.dry_run {
            info!(previous = %previous, new = %new_version, "dry run, nothing written");
            return VersionBumpResult {
                previous_version: previous,
                new_version,
                files_updated: Vec::new(),
                backup: None,
                success: true,
                error: None,
                stage: BumpStage::Done,
                dry_run: true,
            };
        }

        let backup = if request.skip_backup {
            warn!("skipping backup");
            None
        } else {
            let backup = self.backup.create_backup(&previous);
            if !backup.success {
                let reason = backup
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                error!(error = %reason, "backup failed, aborting bump");
                let mut result = VersionBumpResult::failed(
                    &previous,
                    BumpStage::Backup,
                    format!("Backup failed: {}", reason),
                );
                result.backup = Some(backup);
                return result;
            }
            Some(backup)
        };

        let rewrite = self.updater.update_version_in_files(
            &previous,
            &new_version,
            &config.version.files_to_update,
            request.increment_build_number,
        );
        let files_updated = rewrite.updated;
        if let Some(e) = rewrite.error {
            error!(
                error = %e,
                already_updated = files_updated.len(),
                "failed to rewrite version files"
            );
            let mut result =
                VersionBumpResult::failed(&previous, BumpStage::Rewrite, e.to_string());
            result.files_updated = files_updated;
            result.backup = backup;
            return result;
        }

        if let Some(path) = config_path {
            let outcome = self.updater.update_config(path, &new_version);
            let reason = match outcome {
                Ok(true) => None,
                Ok(false) => Some(format!(
                    "{} has no version section to update",
                    path.display()
                )),
                Err(e) => Some(e.to_string()),
            };
            if let Some(reason) = reason {
                error!(error = %reason, "failed to update config version");
                let mut result =
                    VersionBumpResult::failed(&previous, BumpStage::UpdateConfig, reason);
                result.files_updated = files_updated;
                result.backup = backup;
                return result;
            }
        } else {
            debug!("no config file, version only written to project files");
        }

        info!(
            previous = %previous,
            new = %new_version,
            files = files_updated.len(),
            "version bumped"
        );
        VersionBumpResult {
            previous_version: previous,
            new_version,
            files_updated,
            backup,
            success: true,
            error: None,
            stage: BumpStage::Done,
            dry_run: false,
        }
    }

    /// Backups available for restore, newest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        self.backup.list_backups()
    }

    /// Restore a backup, returning the restored files
    pub fn restore(&self, backup: &Path) -> Result<Vec<PathBuf>> {
        self.backup.restore_backup(backup)
    }
}
