//! APK signing with apksigner

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{run_signing_tool, KEY_PASS_ENV, STORE_PASS_ENV};
use crate::config::SigningConfig;
use crate::error::{Result, SigningError};
use crate::signer::{ArtifactSigner, ArtifactType};
use crate::tools::find_build_tool;

/// Signs APKs with the SDK's `apksigner`
#[derive(Debug, Clone, Default)]
pub struct ApkSigner;

impl ApkSigner {
    pub fn new() -> Self {
        Self
    }

    /// `apksigner sign` arguments for the configured schemes
    pub fn sign_args(&self, artifact: &Path, signing: &SigningConfig) -> Vec<String> {
        let schemes = signing.schemes;
        let mut args = vec![
            "sign".to_string(),
            "--ks".to_string(),
            signing.keystore_path.display().to_string(),
            "--ks-key-alias".to_string(),
            signing.key_alias.clone(),
            "--ks-pass".to_string(),
            format!("env:{}", STORE_PASS_ENV),
            "--key-pass".to_string(),
            format!("env:{}", KEY_PASS_ENV),
        ];

        for (flag, enabled) in [
            ("--v1-signing-enabled", schemes.v1),
            ("--v2-signing-enabled", schemes.v2),
            ("--v3-signing-enabled", schemes.v3),
            ("--v4-signing-enabled", schemes.v4),
        ] {
            args.push(flag.to_string());
            args.push(enabled.to_string());
        }

        args.push(artifact.display().to_string());
        args
    }
}

#[async_trait]
impl ArtifactSigner for ApkSigner {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Apk
    }

    #[instrument(skip(self, signing), fields(artifact = %artifact.display()))]
    async fn sign(&self, artifact: &Path, signing: &SigningConfig) -> Result<Vec<String>> {
        if !signing.schemes.any() {
            return Err(SigningError::ConfigError(
                "no APK signature scheme enabled".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        if signing.schemes.is_v1_only() {
            warn!("signing with APK signature scheme v1 only");
            warnings.push(
                "APK signature scheme v1 alone is deprecated; enable v2 or later".to_string(),
            );
        }

        let apksigner = find_build_tool("apksigner", signing.sdk_root.as_deref())?;
        run_signing_tool(&apksigner, &self.sign_args(artifact, signing), signing).await?;

        info!(alias = %signing.key_alias, "APK signed");
        Ok(warnings)
    }
}
