//! App Store upload

use std::path::Path;

use async_trait::async_trait;
use tracing::instrument;

use launchpad_core::config::AppStoreDestination;
use launchpad_core::Config;

use super::auth::ApiKey;
use super::transporter::Transporter;
use crate::client::{DestinationClient, UploadRequest, UploadResponse};
use crate::error::Result;
use crate::result::Destination;

/// Uploads a release build for App Store review.
///
/// Submitting the version for review stays a manual step in App Store
/// Connect; the response links to the version page.
pub struct AppStoreClient {
    transporter: Transporter,
    app_id: Option<String>,
}

impl AppStoreClient {
    pub fn new(destination: &AppStoreDestination, config: &Config, base_dir: &Path) -> Result<Self> {
        let key = ApiKey::resolve(&destination.auth, config, base_dir)?;
        Ok(Self {
            transporter: Transporter::new(&key)?,
            app_id: destination.auth.app_id.clone(),
        })
    }

    pub fn with_transporter(mut self, transporter: Transporter) -> Self {
        self.transporter = transporter;
        self
    }

    pub fn version_url(&self) -> Option<String> {
        self.app_id
            .as_ref()
            .map(|id| format!("https://appstoreconnect.apple.com/apps/{}/appstore/ios", id))
    }
}

#[async_trait]
impl DestinationClient for AppStoreClient {
    fn destination(&self) -> Destination {
        Destination::AppStore
    }

    #[instrument(skip(self, _request), fields(artifact = %artifact.display()))]
    async fn upload(&self, artifact: &Path, _request: &UploadRequest) -> Result<UploadResponse> {
        self.transporter.upload(artifact).await?;

        let response = UploadResponse::succeeded("Uploaded to App Store Connect; submit for review when ready");
        Ok(match self.version_url() {
            Some(url) => response.with_build_url(url),
            None => response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::config::AppStoreConnectAuth;
    use tempfile::TempDir;

    #[test]
    fn test_version_url() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("AuthKey_K1.p8"), "pem").unwrap();
        let destination = AppStoreDestination {
            enabled: true,
            auth: AppStoreConnectAuth {
                api_key_id: Some("K1".to_string()),
                issuer_id: Some("I1".to_string()),
                api_key_path: Some("AuthKey_K1.p8".into()),
                app_id: Some("123".to_string()),
            },
        };

        let client = AppStoreClient::new(&destination, &Config::default(), temp.path()).unwrap();
        assert_eq!(
            client.version_url().as_deref(),
            Some("https://appstoreconnect.apple.com/apps/123/appstore/ios")
        );
    }
}
