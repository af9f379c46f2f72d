//! Destination client contract

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::result::Destination;

/// Metadata sent along with an artifact
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Release notes or "What to Test" text
    pub release_notes: Option<String>,
    /// Tester groups; empty means the destination's configured groups
    pub test_groups: Vec<String>,
}

impl UploadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release_notes(mut self, notes: impl Into<String>) -> Self {
        self.release_notes = Some(notes.into());
        self
    }

    pub fn with_test_groups(mut self, groups: Vec<String>) -> Self {
        self.test_groups = groups;
        self
    }

    /// Groups from the request, falling back to `configured`
    pub fn groups_or<'a>(&'a self, configured: &'a [String]) -> &'a [String] {
        if self.test_groups.is_empty() {
            configured
        } else {
            &self.test_groups
        }
    }
}

/// What a destination reports back after an upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub build_id: Option<String>,
    pub message: String,
    pub build_url: Option<String>,
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    /// The destination accepted the request but rejected the build
    pub fn rejected(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_build_id(mut self, id: impl Into<String>) -> Self {
        self.build_id = Some(id.into());
        self
    }

    pub fn with_build_url(mut self, url: impl Into<String>) -> Self {
        self.build_url = Some(url.into());
        self
    }
}

/// Uploads a signed artifact to one destination.
///
/// The artifact is only ever read. Implementations own their network
/// timeouts; the deploy orchestrator adds an outer bound.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Destination served by this client
    fn destination(&self) -> Destination;

    /// Upload `artifact`
    async fn upload(&self, artifact: &Path, request: &UploadRequest) -> Result<UploadResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_fallback() {
        let configured = vec!["qa".to_string()];
        let request = UploadRequest::new();
        assert_eq!(request.groups_or(&configured), &["qa".to_string()]);

        let request = request.with_test_groups(vec!["beta".to_string()]);
        assert_eq!(request.groups_or(&configured), &["beta".to_string()]);
    }
}
