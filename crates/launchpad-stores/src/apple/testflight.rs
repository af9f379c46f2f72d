//! TestFlight beta distribution
//!
//! The IPA goes up through altool. When `wait_for_processing` is set the
//! client then polls App Store Connect until the build is processed, sets the
//! "What to Test" notes and adds the build to the configured beta groups.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use launchpad_core::config::TestFlightDestination;
use launchpad_core::Config;

use super::api::{AppStoreConnectApi, BuildInfo, ProcessingState};
use super::auth::ApiKey;
use super::transporter::Transporter;
use crate::client::{DestinationClient, UploadRequest, UploadResponse};
use crate::error::{Result, StoreError};
use crate::result::Destination;

pub struct TestFlightClient {
    transporter: Transporter,
    api: AppStoreConnectApi,
    app_id: Option<String>,
    bundle_id: Option<String>,
    groups: Vec<String>,
    wait_for_processing: bool,
    poll_interval: Duration,
    max_polls: u32,
}

impl TestFlightClient {
    pub fn new(destination: &TestFlightDestination, config: &Config, base_dir: &Path) -> Result<Self> {
        let key = ApiKey::resolve(&destination.auth, config, base_dir)?;
        Ok(Self {
            transporter: Transporter::new(&key)?,
            api: AppStoreConnectApi::new(key),
            app_id: destination.auth.app_id.clone(),
            bundle_id: config.app.bundle_id.clone(),
            groups: destination.groups.clone(),
            wait_for_processing: destination.wait_for_processing,
            poll_interval: Duration::from_secs(30),
            max_polls: 60,
        })
    }

    pub fn with_transporter(mut self, transporter: Transporter) -> Self {
        self.transporter = transporter;
        self
    }

    async fn app_id(&self) -> Result<String> {
        if let Some(id) = &self.app_id {
            return Ok(id.clone());
        }
        let bundle_id = self.bundle_id.as_deref().ok_or_else(|| {
            StoreError::ConfigurationError(
                "TestFlight needs app_id or app.bundle_id to find the build".to_string(),
            )
        })?;
        self.api.find_app_id(bundle_id).await
    }

    async fn wait_for_build(&self, app_id: &str) -> Result<BuildInfo> {
        for _ in 0..self.max_polls {
            if let Some(build) = self.api.latest_build(app_id).await? {
                if build.state.is_finished() {
                    return Ok(build);
                }
                info!(build = %build.version, "waiting for processing");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(StoreError::Timeout(
            "build did not finish processing on App Store Connect".to_string(),
        ))
    }

    async fn distribute(&self, app_id: &str, build: &BuildInfo, request: &UploadRequest) -> Result<Vec<String>> {
        let mut notes = Vec::new();

        if let Some(text) = request.release_notes.as_deref().filter(|t| !t.trim().is_empty()) {
            self.api.set_whats_new(&build.id, text).await?;
        }

        let groups = request.groups_or(&self.groups);
        if !groups.is_empty() {
            let (ids, unknown) = self.api.beta_group_ids(app_id, groups).await?;
            for id in &ids {
                self.api.add_build_to_group(id, &build.id).await?;
            }
            if !unknown.is_empty() {
                warn!(?unknown, "beta groups not found");
                notes.push(format!("unknown beta groups: {}", unknown.join(", ")));
            }
        }

        Ok(notes)
    }
}

pub(crate) fn testflight_url(app_id: &str) -> String {
    format!("https://appstoreconnect.apple.com/apps/{}/testflight/ios", app_id)
}

#[async_trait]
impl DestinationClient for TestFlightClient {
    fn destination(&self) -> Destination {
        Destination::TestFlight
    }

    #[instrument(skip(self, request), fields(artifact = %artifact.display()))]
    async fn upload(&self, artifact: &Path, request: &UploadRequest) -> Result<UploadResponse> {
        self.transporter.upload(artifact).await?;

        if !self.wait_for_processing {
            if request.release_notes.is_some() || !request.groups_or(&self.groups).is_empty() {
                warn!("notes and beta groups are only applied when wait_for_processing is set");
            }
            let response = UploadResponse::succeeded("Uploaded to TestFlight; processing on App Store Connect");
            return Ok(match &self.app_id {
                Some(id) => response.with_build_url(testflight_url(id)),
                None => response,
            });
        }

        let app_id = self.app_id().await?;
        let build = self.wait_for_build(&app_id).await?;
        if build.state != ProcessingState::Valid {
            return Ok(UploadResponse::rejected(
                format!("Build {} was not accepted", build.version),
                format!("processing finished as {:?}", build.state),
            )
            .with_build_id(build.id));
        }

        let extra = self.distribute(&app_id, &build, request).await?;
        let mut message = format!("Build {} available in TestFlight", build.version);
        if !extra.is_empty() {
            message = format!("{} ({})", message, extra.join("; "));
        }

        Ok(UploadResponse::succeeded(message)
            .with_build_id(build.id)
            .with_build_url(testflight_url(&app_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::config::AppStoreConnectAuth;
    use tempfile::TempDir;

    fn destination(wait: bool) -> TestFlightDestination {
        TestFlightDestination {
            enabled: true,
            auth: AppStoreConnectAuth {
                api_key_id: Some("ABC123".to_string()),
                issuer_id: Some("issuer".to_string()),
                api_key_path: Some("AuthKey_ABC123.p8".into()),
                app_id: Some("6450000000".to_string()),
            },
            groups: vec!["QA".to_string()],
            wait_for_processing: wait,
        }
    }

    #[test]
    fn test_new_requires_key_file() {
        let temp = TempDir::new().unwrap();
        let err = TestFlightClient::new(&destination(false), &Config::default(), temp.path())
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_upload_without_waiting() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("AuthKey_ABC123.p8"), "pem").unwrap();
        let script = temp.path().join("fake-xcrun");
        std::fs::write(&script, "#!/bin/sh\necho 'No errors uploading'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let client = TestFlightClient::new(&destination(false), &Config::default(), temp.path()).unwrap();
        let transporter = client.transporter.clone().with_program(&script);
        let client = client.with_transporter(transporter);

        let response = client
            .upload(Path::new("Runner.ipa"), &UploadRequest::new())
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(
            response.build_url.as_deref(),
            Some("https://appstoreconnect.apple.com/apps/6450000000/testflight/ios")
        );
    }
}
