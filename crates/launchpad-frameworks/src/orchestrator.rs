//! Build orchestration
//!
//! Resolves the target platforms, then runs one builder task per platform and
//! collects every outcome into a [`BuildResult`]. Nothing here returns `Err`:
//! every failure is represented in the result.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use launchpad_core::{Config, Platform};

use crate::artifacts::expected_artifact_path;
use crate::builder::{default_builders, BuildOptions, PlatformBuilder};
use crate::detection::ProjectDetector;
use crate::error::BuildError;
use crate::output::{BuildOutput, BuildResult};

/// Fans out over target platforms and aggregates their build outputs
pub struct BuildOrchestrator {
    builders: HashMap<Platform, Arc<dyn PlatformBuilder>>,
    detector: ProjectDetector,
}

impl BuildOrchestrator {
    /// Create an orchestrator with an explicit builder per platform
    pub fn new(builders: HashMap<Platform, Arc<dyn PlatformBuilder>>) -> Self {
        Self {
            builders,
            detector: ProjectDetector::new(),
        }
    }

    /// Target platforms for a run.
    ///
    /// Explicit platforms are kept when enabled; disabled ones are returned
    /// separately. Without an explicit list, enabled platforms found by the
    /// project detector are used.
    pub fn resolve_targets(
        &self,
        config: &Config,
        base_dir: &Path,
        platforms: Option<&[Platform]>,
    ) -> (Vec<Platform>, Vec<Platform>) {
        match platforms {
            Some(requested) => {
                let mut targets = Vec::new();
                let mut disabled = Vec::new();
                for platform in requested {
                    let bucket = if config.is_platform_enabled(*platform) {
                        &mut targets
                    } else {
                        &mut disabled
                    };
                    if !bucket.contains(platform) {
                        bucket.push(*platform);
                    }
                }
                (targets, disabled)
            }
            None => (self.detector.resolve_platforms(config, base_dir), Vec::new()),
        }
    }

    /// Build every target platform
    #[instrument(skip(self, config, platforms), fields(base_dir = %base_dir.display(), dry_run = options.dry_run))]
    pub async fn build(
        &self,
        config: &Config,
        base_dir: &Path,
        platforms: Option<&[Platform]>,
        options: BuildOptions,
    ) -> BuildResult {
        let (targets, disabled) = self.resolve_targets(config, base_dir, platforms);

        let mut outputs: Vec<BuildOutput> = disabled
            .iter()
            .map(|p| {
                warn!(platform = %p, "platform requested but not enabled");
                BuildOutput::failed(
                    *p,
                    format!("{} is not enabled in build config", p.display_name()),
                )
            })
            .collect();

        if targets.is_empty() {
            if outputs.is_empty() {
                error!("no platforms to build");
                return BuildResult::failed("no platforms to build");
            }
            return BuildResult::new(outputs);
        }

        if options.dry_run {
            for platform in &targets {
                let path = expected_artifact_path(config, base_dir, *platform);
                info!(platform = %platform, path = %path.display(), "dry run: skipping build");
                outputs.push(BuildOutput::succeeded(*platform, path));
            }
            return BuildResult::new(outputs);
        }

        match self.run_builders(config, base_dir, &targets, options).await {
            Ok(built) => {
                outputs.extend(built);
                let result = BuildResult::new(outputs);
                if result.success() {
                    info!(count = result.outputs.len(), "all builds succeeded");
                } else {
                    warn!(failed = result.failures().count(), "some builds failed");
                }
                result
            }
            Err(message) => {
                error!(error = %message, "build manager failed");
                BuildResult::failed(message)
            }
        }
    }

    /// Run builders concurrently. A missing builder or a crashed task fails the
    /// whole run; a builder error fails only its own platform.
    ///
    /// Builders are resolved before anything starts. When a task crashes the
    /// remaining ones are aborted and drained, so no build outlives this call.
    async fn run_builders(
        &self,
        config: &Config,
        base_dir: &Path,
        targets: &[Platform],
        options: BuildOptions,
    ) -> std::result::Result<Vec<BuildOutput>, String> {
        let builders = targets
            .iter()
            .map(|platform| {
                self.builders
                    .get(platform)
                    .cloned()
                    .map(|builder| (*platform, builder))
                    .ok_or_else(|| BuildError::NoBuilder(*platform).to_string())
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;

        let mut tasks = JoinSet::new();
        for (index, (platform, builder)) in builders.into_iter().enumerate() {
            let config = config.clone();
            let base_dir = base_dir.to_path_buf();

            tasks.spawn(async move {
                info!(platform = %platform, "building");
                let started = Instant::now();
                let output = match builder.build(&base_dir, &config, options).await {
                    Ok(output) => output,
                    Err(e) => {
                        error!(platform = %platform, error = %e, "builder failed");
                        BuildOutput::failed(platform, e.to_string())
                            .with_duration(started.elapsed().as_millis() as u64)
                    }
                };
                (index, output)
            });
        }

        let mut outputs = Vec::with_capacity(targets.len());
        let mut crashed = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(indexed) => outputs.push(indexed),
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    if crashed.is_none() {
                        error!(error = %e, "build task crashed, aborting the others");
                        tasks.abort_all();
                        crashed = Some(format!("build task failed: {}", e));
                    }
                }
            }
        }

        if let Some(message) = crashed {
            return Err(message);
        }
        outputs.sort_by_key(|(index, _)| *index);
        Ok(outputs.into_iter().map(|(_, output)| output).collect())
    }
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new(default_builders())
    }
}
