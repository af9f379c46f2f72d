//! Google Play Console
//!
//! Every upload goes through an edit: create it, upload the binary, place the
//! version code on a track, then commit. An edit that fails part way is
//! deleted so it does not block the next attempt.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use launchpad_core::config::PlayConsoleDestination;
use launchpad_core::Config;

use super::auth::{GoogleAuth, ServiceAccountKey, ANDROID_PUBLISHER_SCOPE};
use crate::client::{DestinationClient, UploadRequest, UploadResponse};
use crate::error::{check_status, Result, StoreError};
use crate::result::Destination;

const API_BASE: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const UPLOAD_BASE: &str = "https://androidpublisher.googleapis.com/upload/androidpublisher/v3";
const NOTES_LANGUAGE: &str = "en-US";

/// Play Developer API client for one package
pub struct PlayConsoleClient {
    auth: GoogleAuth,
    client: Client,
    package_name: String,
    track: String,
    rollout: f64,
    status: Option<String>,
}

impl PlayConsoleClient {
    pub fn new(
        destination: &PlayConsoleDestination,
        config: &Config,
        base_dir: &Path,
    ) -> Result<Self> {
        let package_name = config
            .app
            .package_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                StoreError::ConfigurationError("app.package_id is required for Play Console".to_string())
            })?;

        let key = ServiceAccountKey::resolve(
            destination.service_account.as_deref(),
            &destination.service_account_env,
            config,
            base_dir,
        )?;
        let client = Client::new();

        Ok(Self {
            auth: GoogleAuth::new(key, ANDROID_PUBLISHER_SCOPE, client.clone()),
            client,
            package_name,
            track: destination.track.clone(),
            rollout: destination.rollout,
            status: destination.status.clone(),
        })
    }

    /// Tracks page in the Play Console
    pub fn console_url(&self) -> String {
        format!(
            "https://play.google.com/console/developers/app/{}/tracks",
            self.package_name
        )
    }

    /// Release status sent to the track; partial rollouts are `inProgress`
    fn release_status(&self) -> &str {
        match self.status.as_deref() {
            Some(status) => status,
            None if self.rollout < 1.0 => "inProgress",
            None => "completed",
        }
    }

    fn track_body(&self, version_code: i64, notes: Option<&str>) -> serde_json::Value {
        let status = self.release_status();
        let mut release = serde_json::json!({
            "versionCodes": [version_code.to_string()],
            "status": status,
        });

        if status == "inProgress" {
            release["userFraction"] = serde_json::json!(self.rollout);
        }
        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            release["releaseNotes"] = serde_json::json!([{
                "language": NOTES_LANGUAGE,
                "text": notes,
            }]);
        }

        serde_json::json!({
            "track": self.track,
            "releases": [release],
        })
    }

    async fn api_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/applications/{}{}", API_BASE, self.package_name, endpoint);
        debug!(%method, %url, "play api request");

        let mut request = self.client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_edit(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Edit {
            id: String,
        }

        let value = self
            .api_request(Method::POST, "/edits", Some(serde_json::json!({})))
            .await?;
        let edit: Edit = serde_json::from_value(value)?;
        Ok(edit.id)
    }

    async fn upload_binary(&self, edit_id: &str, artifact: &Path) -> Result<i64> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Uploaded {
            version_code: i64,
        }

        let kind = match artifact.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("aab") => "bundles",
            Some(ext) if ext.eq_ignore_ascii_case("apk") => "apks",
            _ => {
                return Err(StoreError::InvalidArtifact(format!(
                    "Play Console accepts .aab or .apk, got {}",
                    artifact.display()
                )))
            }
        };

        let content = tokio::fs::read(artifact).await?;
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(format!(
                "{}/applications/{}/edits/{}/{}",
                UPLOAD_BASE, self.package_name, edit_id, kind
            ))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()
            .await?;

        let uploaded: Uploaded = check_status(response).await?.json().await?;
        Ok(uploaded.version_code)
    }

    async fn publish(&self, edit_id: &str, artifact: &Path, notes: Option<&str>) -> Result<i64> {
        info!("Uploading {}...", artifact.display());
        let version_code = self.upload_binary(edit_id, artifact).await?;

        self.api_request(
            Method::PUT,
            &format!("/edits/{}/tracks/{}", edit_id, self.track),
            Some(self.track_body(version_code, notes)),
        )
        .await?;

        self.api_request(Method::POST, &format!("/edits/{}:commit", edit_id), None)
            .await?;
        Ok(version_code)
    }
}

#[async_trait]
impl DestinationClient for PlayConsoleClient {
    fn destination(&self) -> Destination {
        Destination::PlayConsole
    }

    #[instrument(skip(self, request), fields(package = %self.package_name, track = %self.track))]
    async fn upload(&self, artifact: &Path, request: &UploadRequest) -> Result<UploadResponse> {
        let edit_id = self.create_edit().await?;

        match self
            .publish(&edit_id, artifact, request.release_notes.as_deref())
            .await
        {
            Ok(version_code) => {
                info!(version_code, "edit committed");
                Ok(UploadResponse::succeeded(format!(
                    "Version code {} released to the {} track",
                    version_code, self.track
                ))
                .with_build_id(version_code.to_string())
                .with_build_url(self.console_url()))
            }
            Err(e) => {
                if let Err(cleanup) = self
                    .api_request(Method::DELETE, &format!("/edits/{}", edit_id), None)
                    .await
                {
                    warn!(error = %cleanup, edit_id = %edit_id, "failed to delete edit");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY_JSON: &str = r#"{"client_email":"ci@example.com","private_key":"k"}"#;

    fn client(rollout: f64, status: Option<&str>) -> PlayConsoleClient {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.app.package_id = Some("com.example.app".to_string());
        config
            .env
            .insert("LAUNCHPAD_TEST_PLAY_SA".to_string(), KEY_JSON.to_string());

        let destination = PlayConsoleDestination {
            enabled: true,
            service_account_env: "LAUNCHPAD_TEST_PLAY_SA".to_string(),
            track: "beta".to_string(),
            rollout,
            status: status.map(str::to_string),
            ..Default::default()
        };
        PlayConsoleClient::new(&destination, &config, temp.path()).unwrap()
    }

    #[test]
    fn test_full_rollout_is_completed() {
        let body = client(1.0, None).track_body(42, Some("Bug fixes"));
        let release = &body["releases"][0];
        assert_eq!(body["track"], "beta");
        assert_eq!(release["status"], "completed");
        assert_eq!(release["versionCodes"][0], "42");
        assert!(release.get("userFraction").is_none());
        assert_eq!(release["releaseNotes"][0]["text"], "Bug fixes");
    }

    #[test]
    fn test_staged_rollout() {
        let body = client(0.2, None).track_body(7, None);
        let release = &body["releases"][0];
        assert_eq!(release["status"], "inProgress");
        assert_eq!(release["userFraction"], 0.2);
        assert!(release.get("releaseNotes").is_none());
    }

    #[test]
    fn test_explicit_status_wins() {
        let body = client(0.5, Some("draft")).track_body(7, None);
        assert_eq!(body["releases"][0]["status"], "draft");
        assert!(body["releases"][0].get("userFraction").is_none());
    }

    #[test]
    fn test_requires_package_id() {
        let mut config = Config::default();
        config
            .env
            .insert("GOOGLE_PLAY_SERVICE_ACCOUNT".to_string(), KEY_JSON.to_string());
        let err = PlayConsoleClient::new(&PlayConsoleDestination::default(), &config, Path::new("."))
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::ConfigurationError(_)));
    }
}
