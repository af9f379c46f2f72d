//! Error types for platform builds

use std::path::PathBuf;
use thiserror::Error;

use launchpad_core::Platform;

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Required tool not installed
    #[error("Required tool '{tool}' not found. {install_hint}")]
    ToolNotFound { tool: String, install_hint: String },

    /// Project directory or project file missing
    #[error("No {platform} project found at {path}")]
    ProjectNotFound { platform: Platform, path: PathBuf },

    /// Toolchain reported failure
    #[error("Build failed for {platform}: {message}")]
    BuildFailed { platform: Platform, message: String },

    /// Artifact not found after build
    #[error("Expected artifact not found under {expected_path}")]
    ArtifactNotFound { expected_path: PathBuf },

    /// Command could not be started
    #[error("Command failed: {command}: {reason}")]
    CommandFailed { command: String, reason: String },

    /// No builder registered for a platform
    #[error("No builder registered for {0}")]
    NoBuilder(Platform),

    /// ExportOptions.plist could not be written
    #[error("Failed to write export options: {0}")]
    Plist(#[from] plist::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
