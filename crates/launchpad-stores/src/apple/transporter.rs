//! IPA upload through `xcrun altool`
//!
//! altool finds the `.p8` key by name (`AuthKey_<KEY_ID>.p8`) in the
//! directory given by `API_PRIVATE_KEYS_DIR`, so the key file must follow
//! that naming.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::auth::ApiKey;
use crate::error::{Result, StoreError};

/// Uploads IPAs with an App Store Connect API key
#[derive(Debug, Clone)]
pub struct Transporter {
    program: PathBuf,
    key_id: String,
    issuer_id: String,
    keys_dir: PathBuf,
}

impl Transporter {
    pub fn new(key: &ApiKey) -> Result<Self> {
        let expected = format!("AuthKey_{}.p8", key.key_id);
        let file_name = key
            .key_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name != expected {
            return Err(StoreError::ConfigurationError(format!(
                "altool requires the API key file to be named {} (got {})",
                expected, file_name
            )));
        }

        Ok(Self {
            program: PathBuf::from("xcrun"),
            key_id: key.key_id.clone(),
            issuer_id: key.issuer_id.clone(),
            keys_dir: key
                .key_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        })
    }

    /// Run a different executable in place of `xcrun`
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn upload_args(&self, ipa: &Path) -> Vec<String> {
        vec![
            "altool".to_string(),
            "--upload-app".to_string(),
            "--type".to_string(),
            "ios".to_string(),
            "--file".to_string(),
            ipa.display().to_string(),
            "--apiKey".to_string(),
            self.key_id.clone(),
            "--apiIssuer".to_string(),
            self.issuer_id.clone(),
        ]
    }

    /// Upload an IPA and return altool's output
    #[instrument(skip(self), fields(ipa = %ipa.display()))]
    pub async fn upload(&self, ipa: &Path) -> Result<String> {
        if !ipa
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("ipa"))
        {
            return Err(StoreError::InvalidArtifact(format!(
                "Expected an .ipa, got {}",
                ipa.display()
            )));
        }

        let output = Command::new(&self.program)
            .args(self.upload_args(ipa))
            .env("API_PRIVATE_KEYS_DIR", &self.keys_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StoreError::ToolNotFound(format!(
                    "{} (install Xcode command line tools)",
                    self.program.display()
                )),
                _ => StoreError::CommandFailed(format!("altool failed to start: {}", e)),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(%stdout, %stderr, "altool finished");

        if !output.status.success() || stdout.contains("ERROR ITMS-") || stderr.contains("ERROR ITMS-") {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            let tail: Vec<&str> = detail.lines().rev().take(10).collect();
            return Err(StoreError::UploadFailed(
                tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
            ));
        }

        info!("upload accepted by App Store Connect");
        Ok(stdout)
    }
}
