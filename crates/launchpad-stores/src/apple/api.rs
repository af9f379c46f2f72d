//! App Store Connect REST calls used after an upload

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::auth::{ApiKey, TokenProvider};
use crate::error::{check_status, Result, StoreError};

const API_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Processing state of an uploaded build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Processing,
    Valid,
    Invalid,
    Failed,
}

impl ProcessingState {
    pub fn parse(s: &str) -> Self {
        match s {
            "VALID" => Self::Valid,
            "INVALID" => Self::Invalid,
            "FAILED" => Self::Failed,
            _ => Self::Processing,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// A build as reported by App Store Connect
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub id: String,
    pub version: String,
    pub state: ProcessingState,
}

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Resource<A> {
    id: String,
    attributes: A,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildAttributes {
    version: String,
    processing_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedAttributes {
    name: String,
}

impl From<Resource<BuildAttributes>> for BuildInfo {
    fn from(r: Resource<BuildAttributes>) -> Self {
        Self {
            id: r.id,
            version: r.attributes.version,
            state: ProcessingState::parse(r.attributes.processing_state.as_deref().unwrap_or("")),
        }
    }
}

/// Minimal App Store Connect client
pub struct AppStoreConnectApi {
    client: Client,
    tokens: TokenProvider,
}

impl AppStoreConnectApi {
    pub fn new(key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            tokens: TokenProvider::new(key),
        }
    }

    pub fn key(&self) -> &ApiKey {
        self.tokens.key()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let token = self.tokens.token().await?;
        let url = format!("{}{}", API_BASE_URL, endpoint);
        debug!(%method, %url, "app store connect request");

        let mut request = self.client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn request_no_content(
        &self,
        method: Method,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<()> {
        let token = self.tokens.token().await?;
        let response = self
            .client
            .request(method, format!("{}{}", API_BASE_URL, endpoint))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Look up the App Store Connect app ID for a bundle identifier
    pub async fn find_app_id(&self, bundle_id: &str) -> Result<String> {
        let doc: Document<Vec<Resource<serde_json::Value>>> = self
            .request(
                Method::GET,
                &format!("/apps?filter[bundleId]={}&limit=1", bundle_id),
                None,
            )
            .await?;
        doc.data
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| StoreError::ConfigurationError(format!("No app found for {}", bundle_id)))
    }

    /// Most recently uploaded build of the app
    pub async fn latest_build(&self, app_id: &str) -> Result<Option<BuildInfo>> {
        let doc: Document<Vec<Resource<BuildAttributes>>> = self
            .request(
                Method::GET,
                &format!("/builds?filter[app]={}&sort=-uploadedDate&limit=1", app_id),
                None,
            )
            .await?;
        Ok(doc.data.into_iter().next().map(BuildInfo::from))
    }

    pub async fn build(&self, build_id: &str) -> Result<BuildInfo> {
        let doc: Document<Resource<BuildAttributes>> = self
            .request(Method::GET, &format!("/builds/{}", build_id), None)
            .await?;
        Ok(doc.data.into())
    }

    /// Set the "What to Test" text for a build
    pub async fn set_whats_new(&self, build_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "data": {
                "type": "betaBuildLocalizations",
                "attributes": { "locale": "en-US", "whatsNew": text },
                "relationships": {
                    "build": { "data": { "type": "builds", "id": build_id } }
                }
            }
        });
        let _: serde_json::Value = self
            .request(Method::POST, "/betaBuildLocalizations", Some(body))
            .await?;
        Ok(())
    }

    /// IDs of the named beta groups; unknown names are returned separately
    pub async fn beta_group_ids(
        &self,
        app_id: &str,
        names: &[String],
    ) -> Result<(Vec<String>, Vec<String>)> {
        let doc: Document<Vec<Resource<NamedAttributes>>> = self
            .request(
                Method::GET,
                &format!("/apps/{}/betaGroups?limit=200", app_id),
                None,
            )
            .await?;

        let mut found = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            match doc.data.iter().find(|g| &g.attributes.name == name) {
                Some(group) => found.push(group.id.clone()),
                None => unknown.push(name.clone()),
            }
        }
        Ok((found, unknown))
    }

    pub async fn add_build_to_group(&self, group_id: &str, build_id: &str) -> Result<()> {
        self.request_no_content(
            Method::POST,
            &format!("/betaGroups/{}/relationships/builds", group_id),
            serde_json::json!({ "data": [{ "type": "builds", "id": build_id }] }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_state() {
        assert_eq!(ProcessingState::parse("VALID"), ProcessingState::Valid);
        assert_eq!(ProcessingState::parse("PROCESSING"), ProcessingState::Processing);
        assert!(!ProcessingState::parse("").is_finished());
        assert!(ProcessingState::parse("FAILED").is_finished());
    }

    #[test]
    fn test_build_document() {
        let doc: Document<Vec<Resource<BuildAttributes>>> = serde_json::from_str(
            r#"{"data":[{"id":"b1","type":"builds","attributes":{"version":"42","processingState":"VALID"}}]}"#,
        )
        .unwrap();
        let build: BuildInfo = doc.data.into_iter().next().unwrap().into();
        assert_eq!(build.id, "b1");
        assert_eq!(build.version, "42");
        assert_eq!(build.state, ProcessingState::Valid);
    }
}
