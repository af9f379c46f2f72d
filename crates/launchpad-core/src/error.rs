//! Error types for Launchpad

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LaunchpadError
pub type Result<T> = std::result::Result<T, LaunchpadError>;

/// Main error type for Launchpad core operations
#[derive(Debug, Error)]
pub enum LaunchpadError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// One or more fields failed validation
    #[error("Invalid configuration ({} problem(s)): {}", .0.len(), join_violations(.0))]
    Invalid(Vec<crate::config::ConfigViolation>),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML document editing error
    #[error("TOML editing error: {0}")]
    TomlEditError(#[from] toml_edit::TomlError),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

fn join_violations(violations: &[crate::config::ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Invalid bump level
    #[error("Invalid bump level: {0} (expected major, minor or patch)")]
    InvalidBumpLevel(String),

    /// The manual strategy needs an explicit level
    #[error("Bump strategy is manual; pass an explicit level")]
    LevelRequired,

    /// Backup could not be created
    #[error("Backup failed: {0}")]
    BackupFailed(String),

    /// Backup could not be found or read
    #[error("Backup not found at {0}")]
    BackupNotFound(PathBuf),

    /// A version file could not be rewritten
    #[error("Failed to update {path}: {reason}")]
    UpdateFailed { path: PathBuf, reason: String },

    /// Invalid glob pattern in files_to_update
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Failed to read commit history
    #[error("Failed to read commit history: {0}")]
    HistoryUnavailable(String),

    /// Changelog file not found
    #[error("Changelog file not found at {0}")]
    FileNotFound(PathBuf),

    /// No backup of the changelog exists
    #[error("No changelog backup found at {0}")]
    BackupNotFound(PathBuf),

    /// Version section not present in changelog
    #[error("Version {0} not found in changelog")]
    VersionNotFound(String),

    /// Release notes file could not be parsed
    #[error("Invalid release notes in {path}: {reason}")]
    InvalidReleaseNotes { path: PathBuf, reason: String },

    /// Rendering failed
    #[error("Failed to render changelog: {0}")]
    RenderFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchpadError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
