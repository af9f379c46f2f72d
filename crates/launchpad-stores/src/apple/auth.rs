//! App Store Connect API keys
//!
//! Tokens are ES256 JWTs signed with the team's `.p8` key, valid for twenty
//! minutes and reused until five minutes before expiry.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio::sync::Mutex;

use launchpad_core::config::AppStoreConnectAuth;
use launchpad_core::Config;

use crate::error::{Result, StoreError};

pub const KEY_ID_ENV: &str = "APP_STORE_CONNECT_KEY_ID";
pub const ISSUER_ID_ENV: &str = "APP_STORE_CONNECT_ISSUER_ID";
pub const KEY_PATH_ENV: &str = "APP_STORE_CONNECT_KEY_PATH";

const AUDIENCE: &str = "appstoreconnect-v1";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
    aud: &'a str,
}

/// A resolved App Store Connect API key
#[derive(Clone)]
pub struct ApiKey {
    pub key_id: String,
    pub issuer_id: String,
    pub key_path: PathBuf,
    pem: String,
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .field("key_path", &self.key_path)
            .finish()
    }
}

impl ApiKey {
    /// Resolve key ID, issuer and key file from config, falling back to the
    /// `APP_STORE_CONNECT_*` environment variables.
    pub fn resolve(auth: &AppStoreConnectAuth, config: &Config, base_dir: &Path) -> Result<Self> {
        let key_id = auth
            .api_key_id
            .clone()
            .or_else(|| config.env_var(KEY_ID_ENV))
            .ok_or_else(|| missing("api_key_id", KEY_ID_ENV))?;
        let issuer_id = auth
            .issuer_id
            .clone()
            .or_else(|| config.env_var(ISSUER_ID_ENV))
            .ok_or_else(|| missing("issuer_id", ISSUER_ID_ENV))?;
        let key_path = auth
            .api_key_path
            .clone()
            .or_else(|| config.env_var(KEY_PATH_ENV).map(PathBuf::from))
            .map(|p| base_dir.join(p))
            .ok_or_else(|| missing("api_key_path", KEY_PATH_ENV))?;

        let pem = std::fs::read_to_string(&key_path).map_err(|e| {
            StoreError::ConfigurationError(format!(
                "Failed to read API key {}: {}",
                key_path.display(),
                e
            ))
        })?;

        Ok(Self {
            key_id,
            issuer_id,
            key_path,
            pem,
        })
    }

    fn sign(&self, now: DateTime<Utc>, expires: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            iss: &self.issuer_id,
            iat: now.timestamp(),
            exp: expires.timestamp(),
            aud: AUDIENCE,
        };

        let key = EncodingKey::from_ec_pem(self.pem.as_bytes())
            .map_err(|e| StoreError::InvalidCredentials(format!("Invalid API key: {}", e)))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        Ok(encode(&header, &claims, &key)?)
    }
}

fn missing(field: &str, env: &str) -> StoreError {
    StoreError::ConfigurationError(format!(
        "App Store Connect {} is not configured (set it or {})",
        field, env
    ))
}

/// Caching JWT provider
pub struct TokenProvider {
    key: ApiKey,
    cached: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl TokenProvider {
    pub fn new(key: ApiKey) -> Self {
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ApiKey {
        &self.key
    }

    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some((token, expires)) = cached.as_ref() {
            if Utc::now() < *expires - Duration::minutes(5) {
                return Ok(token.clone());
            }
        }

        let now = Utc::now();
        let expires = now + Duration::minutes(20);
        let token = self.key.sign(now, expires)?;
        *cached = Some((token.clone(), expires));
        Ok(token)
    }
}
