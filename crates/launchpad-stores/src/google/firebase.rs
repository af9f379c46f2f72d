//! Firebase App Distribution
//!
//! Upload is asynchronous on Firebase's side: the upload call returns a
//! long-running operation which is polled until the release exists. Release
//! notes and distribution to testers are applied to that release afterwards.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use launchpad_core::config::FirebaseDestination;
use launchpad_core::Config;

use super::auth::{GoogleAuth, ServiceAccountKey, CLOUD_PLATFORM_SCOPE};
use crate::client::{DestinationClient, UploadRequest, UploadResponse};
use crate::error::{check_status, Result, StoreError};
use crate::result::Destination;

const API_BASE: &str = "https://firebaseappdistribution.googleapis.com/v1";
const UPLOAD_BASE: &str = "https://firebaseappdistribution.googleapis.com/upload/v1";

#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    result: Option<String>,
    release: Option<Release>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Release {
    name: String,
    display_version: Option<String>,
    build_version: Option<String>,
    firebase_console_uri: Option<String>,
}

/// Firebase App Distribution client for one app
pub struct FirebaseClient {
    auth: GoogleAuth,
    client: Client,
    project_number: String,
    app_id: String,
    groups: Vec<String>,
    testers: Vec<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl FirebaseClient {
    pub fn new(destination: &FirebaseDestination, config: &Config, base_dir: &Path) -> Result<Self> {
        if destination.app_id.trim().is_empty() {
            return Err(StoreError::ConfigurationError(
                "Firebase app_id is not set".to_string(),
            ));
        }
        let project_number = destination.project_number().ok_or_else(|| {
            StoreError::ConfigurationError(format!(
                "Cannot derive a project number from Firebase app ID '{}'; set project_number",
                destination.app_id
            ))
        })?;

        let key = ServiceAccountKey::resolve(
            destination.service_account.as_deref(),
            &destination.service_account_env,
            config,
            base_dir,
        )?;
        let client = Client::new();

        Ok(Self {
            auth: GoogleAuth::new(key, CLOUD_PLATFORM_SCOPE, client.clone()),
            client,
            project_number,
            app_id: destination.app_id.clone(),
            groups: destination.groups.clone(),
            testers: destination.testers.clone(),
            poll_interval: Duration::from_secs(5),
            max_polls: 60,
        })
    }

    fn app_path(&self) -> String {
        format!("projects/{}/apps/{}", self.project_number, self.app_id)
    }

    /// Releases page in the Firebase console
    pub fn console_url(&self) -> String {
        format!(
            "https://console.firebase.google.com/project/_/appdistribution/app/{}/releases",
            self.app_id
        )
    }

    async fn upload_binary(&self, artifact: &Path) -> Result<String> {
        let mime = match artifact
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("apk") => "application/vnd.android.package-archive",
            Some("aab") | Some("ipa") => "application/octet-stream",
            _ => {
                return Err(StoreError::InvalidArtifact(format!(
                    "Unsupported file type: {}. Expected APK, AAB or IPA.",
                    artifact.display()
                )))
            }
        };

        let content = tokio::fs::read(artifact).await?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        let part = Part::bytes(content)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| StoreError::UploadFailed(format!("Failed to create multipart: {}", e)))?;

        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(format!("{}/{}/releases:upload", UPLOAD_BASE, self.app_path()))
            .bearer_auth(token)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(Form::new().part("file", part))
            .send()
            .await?;

        let operation: Operation = check_status(response).await?.json().await?;
        debug!(operation = %operation.name, "upload accepted");
        Ok(operation.name)
    }

    async fn wait_for_release(&self, operation: &str) -> Result<Release> {
        for _ in 0..self.max_polls {
            let token = self.auth.access_token().await?;
            let response = self
                .client
                .get(format!("{}/{}", API_BASE, operation))
                .bearer_auth(token)
                .send()
                .await?;
            let op: Operation = check_status(response).await?.json().await?;

            if let Some(error) = op.error {
                return Err(StoreError::UploadFailed(error.message));
            }
            if op.done {
                let response = op.response.ok_or_else(|| {
                    StoreError::UploadFailed("operation finished without a release".to_string())
                })?;
                debug!(result = ?response.result, "upload processed");
                return response.release.ok_or_else(|| {
                    StoreError::UploadFailed("operation finished without a release".to_string())
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(StoreError::Timeout(format!(
            "Firebase did not finish processing {}",
            operation
        )))
    }

    async fn update_release_notes(&self, release: &str, notes: &str) -> Result<()> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .patch(format!("{}/{}", API_BASE, release))
            .bearer_auth(token)
            .query(&[("updateMask", "releaseNotes.text")])
            .json(&serde_json::json!({ "releaseNotes": { "text": notes } }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn distribute(&self, release: &str, groups: &[String]) -> Result<()> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(format!("{}/{}:distribute", API_BASE, release))
            .bearer_auth(token)
            .json(&serde_json::json!({
                "testerEmails": self.testers,
                "groupAliases": groups,
            }))
            .send()
            .await?;
        check_status(response).await?;

        info!(
            groups = groups.len(),
            testers = self.testers.len(),
            "release distributed"
        );
        Ok(())
    }
}

#[async_trait]
impl DestinationClient for FirebaseClient {
    fn destination(&self) -> Destination {
        Destination::Firebase
    }

    #[instrument(skip(self, request), fields(app_id = %self.app_id))]
    async fn upload(&self, artifact: &Path, request: &UploadRequest) -> Result<UploadResponse> {
        let operation = self.upload_binary(artifact).await?;
        let release = self.wait_for_release(&operation).await?;
        info!(release = %release.name, "release created");

        if let Some(notes) = request.release_notes.as_deref().filter(|n| !n.trim().is_empty()) {
            self.update_release_notes(&release.name, notes).await?;
        }

        let groups = request.groups_or(&self.groups);
        if !groups.is_empty() || !self.testers.is_empty() {
            self.distribute(&release.name, groups).await?;
        }

        let version = match (&release.display_version, &release.build_version) {
            (Some(display), Some(build)) => format!(" {} ({})", display, build),
            (Some(display), None) => format!(" {}", display),
            _ => String::new(),
        };

        Ok(
            UploadResponse::succeeded(format!("Release{} uploaded to Firebase", version))
                .with_build_id(release.name)
                .with_build_url(
                    release
                        .firebase_console_uri
                        .unwrap_or_else(|| self.console_url()),
                ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY_JSON: &str = r#"{"client_email":"ci@example.com","private_key":"k"}"#;

    fn destination(app_id: &str) -> FirebaseDestination {
        FirebaseDestination {
            enabled: true,
            app_id: app_id.to_string(),
            service_account_env: "LAUNCHPAD_TEST_FIREBASE_SA".to_string(),
            ..Default::default()
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config
            .env
            .insert("LAUNCHPAD_TEST_FIREBASE_SA".to_string(), KEY_JSON.to_string());
        config
    }

    #[test]
    fn test_new_derives_project_number() {
        let temp = TempDir::new().unwrap();
        let client = FirebaseClient::new(
            &destination("1:1234567890:android:abc123"),
            &config(),
            temp.path(),
        )
        .unwrap();
        assert_eq!(client.app_path(), "projects/1234567890/apps/1:1234567890:android:abc123");
        assert!(client.console_url().contains("1:1234567890:android:abc123"));
    }

    #[test]
    fn test_new_rejects_unparseable_app_id() {
        let temp = TempDir::new().unwrap();
        let err = FirebaseClient::new(&destination("not-an-app-id"), &config(), temp.path())
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn test_unsupported_artifact() {
        let temp = TempDir::new().unwrap();
        let client = FirebaseClient::new(
            &destination("1:1234567890:ios:abc123"),
            &config(),
            temp.path(),
        )
        .unwrap();
        let err = client
            .upload_binary(&temp.path().join("Runner.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArtifact(_)));
    }

    #[test]
    fn test_operation_parsing() {
        let op: Operation = serde_json::from_str(
            r#"{
                "name": "projects/1/apps/a/releases/-/operations/42",
                "done": true,
                "response": {
                    "result": "RELEASE_CREATED",
                    "release": {
                        "name": "projects/1/apps/a/releases/r1",
                        "displayVersion": "1.2.0",
                        "buildVersion": "12",
                        "firebaseConsoleUri": "https://console.firebase.google.com/r1"
                    }
                }
            }"#,
        )
        .unwrap();
        assert!(op.done);
        let release = op.response.unwrap().release.unwrap();
        assert_eq!(release.display_version.as_deref(), Some("1.2.0"));
    }
}
