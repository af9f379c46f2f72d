//! Release pipeline: build, sign, then deploy
//!
//! Each stage is owned by its orchestrator; this module only wires them
//! together. Failures stay values all the way through so that every platform
//! and destination is attempted and reported.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, instrument, warn};

use launchpad_changelog::ChangelogFile;
use launchpad_core::{Config, Platform};
use launchpad_frameworks::{BuildOptions, BuildOrchestrator, BuildOutput, BuildResult};
use launchpad_signing::{ArtifactType, SigningOrchestrator, SigningResult};
use launchpad_stores::{DeployOrchestrator, DeploymentResults, UploadRequest};

/// Build outcome plus the signing outcome of each artifact that was signed
#[derive(Debug, Clone)]
pub struct SignedBuild {
    pub build: BuildResult,
    pub signing: Vec<SigningResult>,
}

impl SignedBuild {
    /// Signing result for a platform's artifact, if it went through signing
    pub fn signing_for(&self, output: &BuildOutput) -> Option<&SigningResult> {
        let path = output.output_path.as_deref()?;
        self.signing.iter().find(|s| s.artifact == path)
    }

    /// Artifacts that failed to sign
    pub fn signing_failures(&self) -> impl Iterator<Item = &SigningResult> {
        self.signing.iter().filter(|s| !s.success)
    }

    /// Deployable artifact for a platform: built, and signed if signing was attempted
    pub fn artifact(&self, platform: Platform) -> Option<&Path> {
        let output = self.build.output(platform).filter(|o| o.success)?;
        if self.signing_for(output).is_some_and(|s| !s.success) {
            return None;
        }
        output.output_path.as_deref()
    }

    /// Every platform built and every attempted signature succeeded
    pub fn success(&self) -> bool {
        self.build.success() && self.signing_failures().next().is_none()
    }
}

/// Whether built Android artifacts should go through the signing stage.
///
/// Signing is skipped when no keystore source is configured at all, which
/// leaves signing to the Gradle `signingConfig`.
pub fn wants_signing(config: &Config) -> bool {
    let signing = &config.build.android.signing;
    signing.enabled && (signing.keystore.is_some() || !signing.use_env_for_passwords)
}

/// Build and sign stages
pub struct ReleasePipeline {
    builds: BuildOrchestrator,
    signing: SigningOrchestrator,
}

impl ReleasePipeline {
    pub fn new(builds: BuildOrchestrator, signing: SigningOrchestrator) -> Self {
        Self { builds, signing }
    }

    /// Build the target platforms, then sign unsigned Android artifacts
    #[instrument(skip(self, config, platforms), fields(dry_run = options.dry_run))]
    pub async fn build(
        &self,
        config: &Config,
        base_dir: &Path,
        platforms: Option<&[Platform]>,
        options: BuildOptions,
    ) -> SignedBuild {
        let build = self.builds.build(config, base_dir, platforms, options).await;
        let mut signing = Vec::new();

        if options.dry_run || !wants_signing(config) {
            return SignedBuild { build, signing };
        }

        for output in build.successful() {
            if output.platform != Platform::Android || output.signed {
                continue;
            }
            let Some(path) = output.output_path.as_deref() else {
                continue;
            };
            if ArtifactType::from_path(path).is_none() {
                warn!(path = %path.display(), "not a signable artifact, skipping");
                continue;
            }

            let result = self.signing.sign_artifact(path, config, base_dir).await;
            if !result.success {
                warn!(path = %path.display(), error = ?result.error, "signing failed");
            }
            signing.push(result);
        }

        SignedBuild { build, signing }
    }
}

impl Default for ReleasePipeline {
    fn default() -> Self {
        Self::new(BuildOrchestrator::default(), SigningOrchestrator::default())
    }
}

/// Deploy orchestrators for every platform with enabled destinations
pub fn deployers_for(config: &Config, base_dir: &Path) -> HashMap<Platform, DeployOrchestrator> {
    Platform::ALL
        .into_iter()
        .filter(|p| config.deploy.has_destinations(*p))
        .map(|p| (p, DeployOrchestrator::for_platform(p, config, base_dir)))
        .collect()
}

/// Upload every deployable artifact to its platform's destinations.
///
/// Platforms whose build or signing failed, or that have no destinations,
/// are left out.
#[instrument(skip_all)]
pub async fn deploy_all(
    deployers: &HashMap<Platform, DeployOrchestrator>,
    build: &SignedBuild,
    config: &Config,
    request: &UploadRequest,
) -> Vec<DeploymentResults> {
    let mut all = Vec::new();

    for output in &build.build.outputs {
        let platform = output.platform;
        let Some(deployer) = deployers.get(&platform) else {
            info!(platform = %platform, "no destinations enabled, skipping deploy");
            continue;
        };
        let Some(artifact) = build.artifact(platform) else {
            warn!(platform = %platform, "no deployable artifact, skipping deploy");
            continue;
        };

        let results = deployer.deploy(platform, artifact, config, request).await;
        info!(platform = %platform, succeeded = results.success_count(), failed = results.failure_count(), "deploy finished");
        all.push(results);
    }

    all
}

/// Release notes for uploads: explicit text, a notes file, or the changelog
/// section of the version being shipped
pub fn release_notes(
    explicit: Option<&str>,
    notes_file: Option<&Path>,
    changelog: &Path,
    version: &str,
) -> anyhow::Result<Option<String>> {
    if let Some(text) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(Some(text.trim().to_string()));
    }
    if let Some(path) = notes_file {
        return Ok(Some(std::fs::read_to_string(path)?.trim().to_string()));
    }

    if !changelog.is_file() {
        return Ok(None);
    }
    let section = ChangelogFile::new(changelog).section(version).unwrap_or_default();
    Ok(Some(section.trim().to_string()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use launchpad_frameworks::PlatformBuilder;
    use launchpad_stores::{Destination, DestinationClient, StoreError, UploadResponse};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FakeBuilder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PlatformBuilder for FakeBuilder {
        fn platform(&self) -> Platform {
            Platform::Android
        }

        async fn build(
            &self,
            base_dir: &Path,
            _config: &Config,
            _options: BuildOptions,
        ) -> launchpad_frameworks::Result<BuildOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let path = base_dir.join("app-release.aab");
            std::fs::write(&path, b"bundle")?;
            Ok(BuildOutput::succeeded(Platform::Android, path))
        }
    }

    struct FakeClient {
        destination: Destination,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DestinationClient for FakeClient {
        fn destination(&self) -> Destination {
            self.destination
        }

        async fn upload(
            &self,
            _artifact: &Path,
            _request: &UploadRequest,
        ) -> launchpad_stores::Result<UploadResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::UploadFailed("503 Service Unavailable".to_string()));
            }
            Ok(UploadResponse::succeeded("uploaded")
                .with_build_id("r1")
                .with_build_url("https://console.firebase.google.com/r1"))
        }
    }

    fn project() -> (TempDir, Config) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("android")).unwrap();
        std::fs::write(temp.path().join("android/settings.gradle"), "").unwrap();

        let mut config = Config::default();
        config.app.name = "Rocket".to_string();
        config.app.package_id = Some("com.example.rocket".to_string());
        config.build.android.enabled = true;
        config.build.android.signing.enabled = false;
        config.deploy.android.firebase.enabled = true;
        config.deploy.android.firebase.app_id = "1:123:android:abc".to_string();
        (temp, config)
    }

    fn pipeline(calls: &Arc<AtomicUsize>) -> ReleasePipeline {
        let mut builders: HashMap<Platform, Arc<dyn PlatformBuilder>> = HashMap::new();
        builders.insert(
            Platform::Android,
            Arc::new(FakeBuilder {
                calls: calls.clone(),
            }),
        );
        ReleasePipeline::new(BuildOrchestrator::new(builders), SigningOrchestrator::default())
    }

    fn deployer(clients: Vec<FakeClient>) -> HashMap<Platform, DeployOrchestrator> {
        let clients: HashMap<Destination, Arc<dyn DestinationClient>> = clients
            .into_iter()
            .map(|c| (c.destination, Arc::new(c) as Arc<dyn DestinationClient>))
            .collect();
        HashMap::from([(Platform::Android, DeployOrchestrator::new(clients))])
    }

    #[tokio::test]
    async fn test_android_only_deploys_to_firebase() {
        let (temp, config) = project();
        let builds = Arc::new(AtomicUsize::new(0));
        let uploads = Arc::new(AtomicUsize::new(0));

        let built = pipeline(&builds)
            .build(&config, temp.path(), None, BuildOptions::default())
            .await;
        assert!(built.success());
        assert_eq!(built.build.outputs.len(), 1);
        assert!(built.signing.is_empty());
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        let deployers = deployer(vec![
            FakeClient {
                destination: Destination::Firebase,
                fail: false,
                calls: uploads.clone(),
            },
            FakeClient {
                destination: Destination::PlayConsole,
                fail: false,
                calls: uploads.clone(),
            },
        ]);
        let results = deploy_all(&deployers, &built, &config, &UploadRequest::new()).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].individual.len(), 1);
        assert!(results[0].success());
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
        let firebase = results[0].get(Destination::Firebase).unwrap();
        assert_eq!(firebase.build_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_one_failing_destination_does_not_affect_the_other() {
        let (temp, mut config) = project();
        config.deploy.android.play_console.enabled = true;
        let builds = Arc::new(AtomicUsize::new(0));
        let uploads = Arc::new(AtomicUsize::new(0));

        let built = pipeline(&builds)
            .build(&config, temp.path(), None, BuildOptions::default())
            .await;
        let deployers = deployer(vec![
            FakeClient {
                destination: Destination::Firebase,
                fail: false,
                calls: uploads.clone(),
            },
            FakeClient {
                destination: Destination::PlayConsole,
                fail: true,
                calls: uploads.clone(),
            },
        ]);
        let results = deploy_all(&deployers, &built, &config, &UploadRequest::new()).await;

        let android = &results[0];
        assert_eq!(android.individual.len(), 2);
        assert_eq!(android.success_count(), 1);
        assert_eq!(android.failure_count(), 1);
        assert!(!android.success());

        let firebase = android.get(Destination::Firebase).unwrap();
        assert!(firebase.success);
        assert!(firebase.error.is_none());
        assert_eq!(
            firebase.build_url.as_deref(),
            Some("https://console.firebase.google.com/r1")
        );
        let play = android.get(Destination::PlayConsole).unwrap();
        assert!(play.error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_dry_run_builds_nothing_and_skips_signing() {
        let (temp, mut config) = project();
        config.build.android.signing.enabled = true;
        config.build.android.signing.keystore = Some(PathBuf::from("release.jks"));
        let builds = Arc::new(AtomicUsize::new(0));

        let built = pipeline(&builds)
            .build(
                &config,
                temp.path(),
                None,
                BuildOptions::default().with_dry_run(true),
            )
            .await;

        assert!(built.success());
        assert!(built.signing.is_empty());
        assert_eq!(builds.load(Ordering::SeqCst), 0);
        assert!(!built.artifact(Platform::Android).unwrap().exists());
    }

    #[tokio::test]
    async fn test_signing_failure_blocks_deploy() {
        let (temp, mut config) = project();
        config.build.android.signing.enabled = true;
        config.build.android.signing.keystore = Some(PathBuf::from("missing.jks"));
        let builds = Arc::new(AtomicUsize::new(0));

        let built = pipeline(&builds)
            .build(&config, temp.path(), None, BuildOptions::default())
            .await;

        assert!(built.build.success());
        assert!(!built.success());
        assert_eq!(built.signing_failures().count(), 1);
        assert!(built.artifact(Platform::Android).is_none());

        let uploads = Arc::new(AtomicUsize::new(0));
        let deployers = deployer(vec![FakeClient {
            destination: Destination::Firebase,
            fail: false,
            calls: uploads.clone(),
        }]);
        let results = deploy_all(&deployers, &built, &config, &UploadRequest::new()).await;
        assert!(results.is_empty());
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wants_signing() {
        let mut config = Config::default();
        assert!(!wants_signing(&config));

        config.build.android.signing.keystore = Some(PathBuf::from("release.jks"));
        assert!(wants_signing(&config));

        config.build.android.signing.enabled = false;
        assert!(!wants_signing(&config));
    }

    #[test]
    fn test_release_notes_sources() {
        let temp = TempDir::new().unwrap();
        let changelog = temp.path().join("CHANGELOG.md");

        assert_eq!(
            release_notes(Some(" Bug fixes "), None, &changelog, "1.0.0").unwrap(),
            Some("Bug fixes".to_string())
        );
        assert_eq!(release_notes(None, None, &changelog, "1.0.0").unwrap(), None);

        let notes = temp.path().join("notes.txt");
        std::fs::write(&notes, "From a file\n").unwrap();
        assert_eq!(
            release_notes(None, Some(&notes), &changelog, "1.0.0").unwrap(),
            Some("From a file".to_string())
        );
    }
}
