//! Version management: semantic versions, backups, file rewriting and bumps

mod backup;
mod orchestrator;
mod semantic;
mod updater;

pub use backup::{
    read_manifest, BackupEntry, BackupManifest, BackupResult, BackupTagger, FileVersionBackup,
    VersionBackup,
};
pub use orchestrator::{BumpRequest, BumpStage, VersionBumpResult, VersionOrchestrator};
pub use semantic::SemanticVersion;
pub use updater::{resolve_files, FileUpdater, ProjectFileUpdater, RewriteOutcome};
