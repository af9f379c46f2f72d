//! Signing orchestration

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use launchpad_core::Config;

use crate::config::{resolve_signing, SigningValidation};
use crate::signer::{ArtifactSigner, ArtifactType, SigningResult};
use crate::signers::{AabSigner, ApkSigner};

/// Validates credentials and dispatches artifacts to their type's signer
pub struct SigningOrchestrator {
    signers: HashMap<ArtifactType, Arc<dyn ArtifactSigner>>,
}

impl SigningOrchestrator {
    /// Create an orchestrator with an explicit signer per artifact type
    pub fn new(signers: HashMap<ArtifactType, Arc<dyn ArtifactSigner>>) -> Self {
        Self { signers }
    }

    /// Check whether credentials resolve without touching any artifact
    pub fn is_signing_available(&self, config: &Config, base_dir: &Path) -> bool {
        self.validate(config, base_dir).valid
    }

    /// Resolve and validate signing credentials
    pub fn validate(&self, config: &Config, base_dir: &Path) -> SigningValidation {
        resolve_signing(config, base_dir)
    }

    /// Sign an artifact in place. Every failure is reported in the result.
    #[instrument(skip(self, config), fields(artifact = %artifact.display()))]
    pub async fn sign_artifact(
        &self,
        artifact: &Path,
        config: &Config,
        base_dir: &Path,
    ) -> SigningResult {
        let started = Instant::now();

        let Some(artifact_type) = ArtifactType::from_path(artifact) else {
            warn!("unsupported artifact type");
            return SigningResult::failed(
                artifact,
                None,
                format!("unsupported artifact type: {}", artifact.display()),
            );
        };

        if !artifact.is_file() {
            return SigningResult::failed(
                artifact,
                Some(artifact_type),
                format!("artifact not found: {}", artifact.display()),
            );
        }

        let validation = self.validate(config, base_dir);
        let Some(signing) = validation.config.filter(|_| validation.valid) else {
            warn!(reason = %validation.reason, "signing credentials unavailable");
            return SigningResult::failed(artifact, Some(artifact_type), validation.reason);
        };

        let Some(signer) = self.signers.get(&artifact_type) else {
            return SigningResult::failed(
                artifact,
                Some(artifact_type),
                format!("no signer registered for {}", artifact_type),
            );
        };

        let result = match signer.sign(artifact, &signing).await {
            Ok(warnings) => {
                info!(artifact_type = %artifact_type, warnings = warnings.len(), "artifact signed");
                SigningResult::succeeded(artifact, artifact_type, warnings)
            }
            Err(e) => {
                error!(error = %e, "signing failed");
                SigningResult::failed(artifact, Some(artifact_type), e.to_string())
            }
        };
        result.with_duration(started.elapsed().as_millis() as u64)
    }
}

impl Default for SigningOrchestrator {
    fn default() -> Self {
        let mut signers: HashMap<ArtifactType, Arc<dyn ArtifactSigner>> = HashMap::new();
        signers.insert(ArtifactType::Apk, Arc::new(ApkSigner::new()));
        signers.insert(ArtifactType::Aab, Arc::new(AabSigner::new()));
        Self::new(signers)
    }
}
