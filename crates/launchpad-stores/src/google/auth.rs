//! Google service account authentication
//!
//! A signed RS256 assertion is exchanged for an OAuth2 access token, which is
//! cached until five minutes before it expires.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use launchpad_core::Config;

use crate::error::{Result, StoreError};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope for Firebase App Distribution
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Scope for the Play Developer API
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

/// Google service account credentials
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            StoreError::InvalidCredentials(format!("Invalid service account key: {}", e))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::ConfigurationError(format!(
                "Failed to read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Resolve credentials from an explicit path, or from `env_key` which
    /// may hold either a path or the JSON document itself.
    pub fn resolve(
        path: Option<&Path>,
        env_key: &str,
        config: &Config,
        base_dir: &Path,
    ) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(&base_dir.join(path));
        }

        let value = config.env_var(env_key).ok_or_else(|| {
            StoreError::ConfigurationError(format!(
                "No service account configured and {} is not set",
                env_key
            ))
        })?;

        if value.trim_start().starts_with('{') {
            Self::from_json(&value)
        } else {
            Self::load(&base_dir.join(value))
        }
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(TOKEN_URL)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Default)]
struct TokenCache {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

/// Access token provider for one scope
pub struct GoogleAuth {
    key: ServiceAccountKey,
    scope: &'static str,
    client: Client,
    cache: Arc<RwLock<TokenCache>>,
}

impl GoogleAuth {
    pub fn new(key: ServiceAccountKey, scope: &'static str, client: Client) -> Self {
        Self {
            key,
            scope,
            client,
            cache: Arc::new(RwLock::new(TokenCache::default())),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Get or refresh the access token
    pub async fn access_token(&self) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if let (Some(token), Some(expires)) = (&cache.access_token, cache.expires_at) {
                if Utc::now() < expires - Duration::minutes(5) {
                    return Ok(token.clone());
                }
            }
        }

        let assertion = self.signed_assertion()?;
        debug!(account = %self.key.client_email, scope = self.scope, "requesting access token");

        let response = self
            .client
            .post(self.key.token_uri())
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::AuthenticationFailed(format!(
                "token exchange failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse = response.json().await?;
        let mut cache = self.cache.write().await;
        cache.access_token = Some(token.access_token.clone());
        cache.expires_at = Some(Utc::now() + Duration::seconds(token.expires_in));

        Ok(token.access_token)
    }

    fn signed_assertion(&self) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: self.scope,
            aud: self.key.token_uri(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StoreError::InvalidCredentials(format!("Invalid private key: {}", e)))?;

        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }
}
