//! Error types for signing operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Signing-related errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Signing tool not found
    #[error("Signing tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Tool execution failed
    #[error("Signing tool failed: {tool} - {reason}")]
    ToolFailed { tool: String, reason: String },

    /// Unsupported artifact type
    #[error("Cannot sign {path}: unsupported file type")]
    UnsupportedArtifact { path: PathBuf },

    /// Artifact missing on disk
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    /// Configuration error
    #[error("Signing configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
