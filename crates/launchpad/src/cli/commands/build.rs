//! Build command - build and sign the enabled platforms

use clap::Args;
use console::style;
use tracing::info;

use launchpad_frameworks::BuildOptions;

use crate::cli::context::ProjectContext;
use crate::cli::output;
use crate::cli::{platforms_from, Cli, PlatformArg};
use crate::exit_codes::{CommandFailure, BUILD_FAILURE, SIGNING_FAILURE};
use crate::pipeline::{ReleasePipeline, SignedBuild};

/// Build the project for one or more platforms
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Platforms to build (default: every enabled platform found in the project)
    #[arg(short, long, value_enum)]
    pub platform: Vec<PlatformArg>,

    /// Android product flavor, overriding build.android.flavor
    #[arg(long)]
    pub flavor: Option<String>,
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(platforms = ?self.platform, flavor = ?self.flavor, dry_run = cli.dry_run, "executing build command");
        let mut ctx = ProjectContext::load(cli)?;
        if let Some(flavor) = &self.flavor {
            ctx.config.build.android.flavor = Some(flavor.clone());
        }
        ctx.ensure_valid()?;

        // Run async operation in tokio runtime
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(&ctx, cli))
    }

    async fn execute_async(&self, ctx: &ProjectContext, cli: &Cli) -> anyhow::Result<()> {
        let platforms = platforms_from(&self.platform);
        let options = BuildOptions::new()
            .with_verbose(cli.verbose)
            .with_dry_run(cli.dry_run);

        print_build_header(ctx, cli.dry_run);
        let built = ReleasePipeline::default()
            .build(&ctx.config, &ctx.base_dir, platforms.as_deref(), options)
            .await;

        print_build(&built);
        check_build(&built)
    }
}

pub(crate) fn print_build_header(ctx: &ProjectContext, dry_run: bool) {
    println!(
        "{} {} {}{}",
        output::header("Building"),
        ctx.config.app.name,
        output::version_style().apply_to(ctx.config.current_version()),
        if dry_run {
            style(" (dry run)").yellow().to_string()
        } else {
            String::new()
        }
    );
    println!();
}

/// Per-platform build and signing lines
pub(crate) fn print_build(built: &SignedBuild) {
    if let Some(error) = &built.build.error {
        output::error(error);
        return;
    }

    for build_output in &built.build.outputs {
        let platform = build_output.platform.display_name();
        if !build_output.success {
            output::error(&format!(
                "{}: {}",
                platform,
                build_output.error.as_deref().unwrap_or("build failed")
            ));
            continue;
        }

        let path = build_output
            .output_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        output::success(&format!(
            "{}: {} {}",
            platform,
            output::path_style().apply_to(path),
            output::dim_style().apply_to(format!("({} ms)", build_output.duration_ms))
        ));
        for warning in &build_output.warnings {
            output::warning(warning);
        }

        if let Some(signing) = built.signing_for(build_output) {
            output::outcome(
                signing.success,
                &format!(
                    "{}: {}",
                    platform,
                    signing
                        .error
                        .clone()
                        .unwrap_or_else(|| "artifact signed".to_string())
                ),
            );
            for warning in &signing.warnings {
                output::warning(warning);
            }
        }
    }
}

/// Build failures take precedence over signing failures
pub(crate) fn check_build(built: &SignedBuild) -> anyhow::Result<()> {
    if !built.build.success() {
        let failed = built.build.failures().count();
        let message = match &built.build.error {
            Some(error) => error.clone(),
            None => format!("{} platform build(s) failed", failed),
        };
        return Err(CommandFailure::new(BUILD_FAILURE, message).into());
    }

    let unsigned = built.signing_failures().count();
    if unsigned > 0 {
        return Err(CommandFailure::new(
            SIGNING_FAILURE,
            format!("{} artifact(s) could not be signed", unsigned),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::code_for;
    use launchpad_core::Platform;
    use launchpad_frameworks::{BuildOutput, BuildResult};
    use launchpad_signing::{ArtifactType, SigningResult};
    use std::path::Path;

    fn built(outputs: Vec<BuildOutput>, signing: Vec<SigningResult>) -> SignedBuild {
        SignedBuild {
            build: BuildResult::new(outputs),
            signing,
        }
    }

    #[test]
    fn test_check_build_success() {
        let ok = built(vec![BuildOutput::succeeded(Platform::Android, "app.aab")], vec![]);
        assert!(check_build(&ok).is_ok());
    }

    #[test]
    fn test_build_failure_wins() {
        let failed = built(
            vec![BuildOutput::failed(Platform::Ios, "xcodebuild exited with 65")],
            vec![SigningResult::failed(Path::new("app.aab"), Some(ArtifactType::Aab), "no keystore")],
        );
        let err = check_build(&failed).unwrap_err();
        assert_eq!(code_for(&err), BUILD_FAILURE);
    }

    #[test]
    fn test_signing_failure() {
        let unsigned = built(
            vec![BuildOutput::succeeded(Platform::Android, "app.aab")],
            vec![SigningResult::failed(Path::new("app.aab"), Some(ArtifactType::Aab), "no keystore")],
        );
        let err = check_build(&unsigned).unwrap_err();
        assert_eq!(code_for(&err), SIGNING_FAILURE);
    }

    #[test]
    fn test_no_platforms_is_a_build_failure() {
        let none = SignedBuild {
            build: BuildResult::failed("no platforms to build"),
            signing: vec![],
        };
        let err = check_build(&none).unwrap_err();
        assert_eq!(code_for(&err), BUILD_FAILURE);
        assert_eq!(err.to_string(), "no platforms to build");
    }
}
