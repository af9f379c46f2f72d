//! Build outputs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use launchpad_core::Platform;

/// One platform's build result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOutput {
    /// Whether the build succeeded
    pub success: bool,

    /// Platform that was built
    pub platform: Platform,

    /// Produced artifact
    pub output_path: Option<PathBuf>,

    /// Non-fatal toolchain warnings
    pub warnings: Vec<String>,

    /// Failure description
    pub error: Option<String>,

    /// Whether the artifact is already signed
    pub signed: bool,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl BuildOutput {
    /// Successful output for an artifact
    pub fn succeeded(platform: Platform, output_path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            platform,
            output_path: Some(output_path.into()),
            warnings: Vec::new(),
            error: None,
            signed: false,
            duration_ms: 0,
        }
    }

    /// Failed output carrying an error message
    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform,
            output_path: None,
            warnings: Vec::new(),
            error: Some(error.into()),
            signed: false,
            duration_ms: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Aggregate of all platform outputs for one pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildResult {
    /// One output per attempted platform
    pub outputs: Vec<BuildOutput>,

    /// Failure that prevented builds from running at all
    pub error: Option<String>,
}

impl BuildResult {
    pub fn new(outputs: Vec<BuildOutput>) -> Self {
        Self {
            outputs,
            error: None,
        }
    }

    /// Failed result with no outputs
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            outputs: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// True only when there is at least one output and every output succeeded
    pub fn success(&self) -> bool {
        self.error.is_none()
            && !self.outputs.is_empty()
            && self.outputs.iter().all(|o| o.success)
    }

    /// Output for a platform
    pub fn output(&self, platform: Platform) -> Option<&BuildOutput> {
        self.outputs.iter().find(|o| o.platform == platform)
    }

    /// Successful outputs only
    pub fn successful(&self) -> impl Iterator<Item = &BuildOutput> {
        self.outputs.iter().filter(|o| o.success)
    }

    /// Failed outputs only
    pub fn failures(&self) -> impl Iterator<Item = &BuildOutput> {
        self.outputs.iter().filter(|o| !o.success)
    }
}
