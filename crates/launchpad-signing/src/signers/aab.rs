//! App Bundle signing with jarsigner

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{run_signing_tool, KEY_PASS_ENV, STORE_PASS_ENV};
use crate::config::SigningConfig;
use crate::error::Result;
use crate::signer::{ArtifactSigner, ArtifactType};
use crate::tools::find_jdk_tool;

/// Signature algorithm accepted by Play for bundles
pub const SIGNATURE_ALGORITHM: &str = "SHA256withRSA";

/// Digest algorithm paired with [`SIGNATURE_ALGORITHM`]
pub const DIGEST_ALGORITHM: &str = "SHA-256";

/// Signs Android App Bundles with the JDK's `jarsigner`
#[derive(Debug, Clone, Default)]
pub struct AabSigner;

impl AabSigner {
    pub fn new() -> Self {
        Self
    }

    /// `jarsigner` arguments; the alias comes last as jarsigner requires
    pub fn sign_args(&self, artifact: &Path, signing: &SigningConfig) -> Vec<String> {
        vec![
            "-keystore".to_string(),
            signing.keystore_path.display().to_string(),
            "-storepass:env".to_string(),
            STORE_PASS_ENV.to_string(),
            "-keypass:env".to_string(),
            KEY_PASS_ENV.to_string(),
            "-sigalg".to_string(),
            SIGNATURE_ALGORITHM.to_string(),
            "-digestalg".to_string(),
            DIGEST_ALGORITHM.to_string(),
            artifact.display().to_string(),
            signing.key_alias.clone(),
        ]
    }
}

#[async_trait]
impl ArtifactSigner for AabSigner {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::Aab
    }

    #[instrument(skip(self, signing), fields(artifact = %artifact.display()))]
    async fn sign(&self, artifact: &Path, signing: &SigningConfig) -> Result<Vec<String>> {
        let jarsigner = find_jdk_tool("jarsigner", signing.java_home.as_deref())?;
        let stdout = run_signing_tool(&jarsigner, &self.sign_args(artifact, signing), signing).await?;

        // jarsigner reports certificate problems as warnings on success
        let warnings = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("jar signed") && !l.eq_ignore_ascii_case("warning:"))
            .filter(|l| l.contains("certificate") || l.contains("timestamp"))
            .map(str::to_string)
            .collect();

        info!(alias = %signing.key_alias, "bundle signed");
        Ok(warnings)
    }
}
