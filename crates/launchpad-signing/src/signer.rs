//! Artifact signer contract and signing results

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::SigningConfig;
use crate::error::Result;

/// Kind of Android artifact, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Android Package
    Apk,
    /// Android App Bundle
    Aab,
}

impl ArtifactType {
    /// Detect the artifact type from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "apk" => Some(Self::Apk),
            "aab" => Some(Self::Aab),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apk => "apk",
            Self::Aab => "aab",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of signing one artifact. Never carries credentials.
#[derive(Debug, Clone, Serialize)]
pub struct SigningResult {
    pub success: bool,
    pub artifact: PathBuf,
    pub artifact_type: Option<ArtifactType>,
    /// Non-fatal issues
    pub warnings: Vec<String>,
    /// Fatal signing failure
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl SigningResult {
    pub fn succeeded(artifact: &Path, artifact_type: ArtifactType, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            artifact: artifact.to_path_buf(),
            artifact_type: Some(artifact_type),
            warnings,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failed(
        artifact: &Path,
        artifact_type: Option<ArtifactType>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            artifact: artifact.to_path_buf(),
            artifact_type,
            warnings: Vec::new(),
            error: Some(error.into()),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Signs one artifact type in place
#[async_trait]
pub trait ArtifactSigner: Send + Sync {
    /// Artifact type handled by this signer
    fn artifact_type(&self) -> ArtifactType;

    /// Sign `artifact` in place, returning non-fatal warnings
    async fn sign(&self, artifact: &Path, signing: &SigningConfig) -> Result<Vec<String>>;
}
