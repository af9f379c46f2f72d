//! Android builds through Gradle

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use launchpad_core::{Config, Platform};

use crate::artifacts::{android_output_dir, find_newest};
use crate::builder::{BuildOptions, PlatformBuilder};
use crate::error::{BuildError, Result};
use crate::output::BuildOutput;
use crate::process::run_tool;

/// Builds Android bundles and APKs with the Gradle wrapper (or a global Gradle)
#[derive(Debug, Clone, Default)]
pub struct GradleBuilder;

impl GradleBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the Gradle executable, preferring the project's wrapper
    pub fn gradle_command(&self, project_dir: &Path) -> Result<PathBuf> {
        let wrapper = if cfg!(windows) {
            project_dir.join("gradlew.bat")
        } else {
            project_dir.join("gradlew")
        };

        if wrapper.exists() {
            return Ok(wrapper);
        }

        which::which("gradle").map_err(|_| BuildError::ToolNotFound {
            tool: "gradle".to_string(),
            install_hint: "Add the Gradle wrapper to the project or install Gradle".to_string(),
        })
    }

    /// Arguments for the configured variant. The task name is derived from the
    /// current build settings on every call.
    pub fn gradle_args(&self, config: &Config) -> Vec<String> {
        let android = &config.build.android;
        let mut args = vec![android.gradle_task(), "--stacktrace".to_string()];
        args.extend(android.gradle_args.iter().cloned());
        args
    }
}

#[async_trait]
impl PlatformBuilder for GradleBuilder {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    #[instrument(skip(self, config, options), fields(base_dir = %base_dir.display()))]
    async fn build(
        &self,
        base_dir: &Path,
        config: &Config,
        options: BuildOptions,
    ) -> Result<BuildOutput> {
        let android = &config.build.android;
        let project_dir = base_dir.join(&android.project_dir);
        if !project_dir.is_dir() {
            return Err(BuildError::ProjectNotFound {
                platform: Platform::Android,
                path: project_dir,
            });
        }

        let gradle = self.gradle_command(&project_dir)?;
        let args = self.gradle_args(config);
        info!(task = %android.gradle_task(), gradle = %gradle.display(), "starting gradle build");

        let started = Instant::now();
        let output = run_tool(&gradle, &args, &project_dir, &config.env).await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        if options.verbose {
            debug!(stdout = %output.stdout, "gradle output");
        }

        let warnings = output.warnings();
        if !output.success {
            warn!(exit_code = ?output.exit_code, "gradle build failed");
            return Ok(BuildOutput::failed(
                Platform::Android,
                format!(
                    "{} failed (exit code {:?}):\n{}",
                    android.gradle_task(),
                    output.exit_code,
                    output.tail(20)
                ),
            )
            .with_warnings(warnings)
            .with_duration(duration_ms));
        }

        let search_dir = project_dir.join(android_output_dir(android));
        let artifact = find_newest(&search_dir, android.artifact.extension()).or_else(|| {
            let outputs = project_dir.join("app/build/outputs");
            find_newest(&outputs, android.artifact.extension())
        });

        match artifact {
            Some(path) => {
                info!(artifact = %path.display(), duration_ms, "gradle build finished");
                Ok(BuildOutput::succeeded(Platform::Android, path)
                    .with_warnings(warnings)
                    .with_duration(duration_ms))
            }
            None => Err(BuildError::ArtifactNotFound {
                expected_path: search_dir,
            }),
        }
    }
}
