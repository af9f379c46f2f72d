//! Deploy command - build, sign and upload to every enabled destination

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{info, warn};

use launchpad_core::Platform;
use launchpad_frameworks::BuildOptions;
use launchpad_stores::{
    deploy_summary, DeploymentResults, Destination, UploadRequest, WebhookNotifier,
};

use super::build::{check_build, print_build, print_build_header};
use crate::cli::context::ProjectContext;
use crate::cli::output;
use crate::cli::{platforms_from, Cli, PlatformArg};
use crate::exit_codes::{CommandFailure, DEPLOY_FAILURE};
use crate::pipeline::{deploy_all, deployers_for, release_notes, ReleasePipeline, SignedBuild};
use crate::report::DeploymentReport;

/// Build, sign and distribute the app
#[derive(Debug, Args)]
pub struct DeployCommand {
    /// Platforms to deploy (default: every enabled platform found in the project)
    #[arg(short, long, value_enum)]
    pub platform: Vec<PlatformArg>,

    /// Flavor group from deploy.flavors
    #[arg(long)]
    pub flavor: Option<String>,

    /// Release notes (default: the changelog section of the current version)
    #[arg(long, conflicts_with = "notes_file")]
    pub notes: Option<String>,

    /// Read release notes from a file
    #[arg(long)]
    pub notes_file: Option<PathBuf>,

    /// Tester groups, overriding the configured ones
    #[arg(short, long = "group")]
    pub groups: Vec<String>,
}

impl DeployCommand {
    /// Execute the deploy command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(platforms = ?self.platform, flavor = ?self.flavor, dry_run = cli.dry_run, "executing deploy command");
        let mut ctx = ProjectContext::load(cli)?;

        let mut platforms = platforms_from(&self.platform);
        if let Some(flavor) = &self.flavor {
            let platform = ctx.apply_flavor(flavor)?;
            platforms = Some(vec![platform]);
        }
        ctx.ensure_valid()?;

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(&ctx, platforms, cli))
    }

    async fn execute_async(
        &self,
        ctx: &ProjectContext,
        platforms: Option<Vec<Platform>>,
        cli: &Cli,
    ) -> anyhow::Result<()> {
        let config = &ctx.config;
        let version = config.current_version();
        let options = BuildOptions::new()
            .with_verbose(cli.verbose)
            .with_dry_run(cli.dry_run);

        print_build_header(ctx, cli.dry_run);
        let built = ReleasePipeline::default()
            .build(config, &ctx.base_dir, platforms.as_deref(), options)
            .await;
        print_build(&built);

        let request = self.upload_request(ctx)?;

        if cli.dry_run {
            print_plan(ctx, &built, &request);
            return check_build(&built);
        }

        println!();
        println!("{}", output::header("Deploying"));
        let deployers = deployers_for(config, &ctx.base_dir);
        let results = deploy_all(&deployers, &built, config, &request).await;
        print_results(&results, &built);

        if config.report.enabled {
            for platform_results in &results {
                let report = DeploymentReport::new(
                    config,
                    version,
                    built.artifact(platform_results.platform),
                    platform_results,
                );
                match report.write(&ctx.base_dir, config) {
                    Ok(path) => output::info(&format!(
                        "Report written to {}",
                        output::path_style().apply_to(path.display())
                    )),
                    Err(e) => output::warning(&format!("Could not write report: {}", e)),
                }
            }
        }

        let deployed = results.iter().all(DeploymentResults::success);
        if !results.is_empty() {
            notify(ctx, version, &results, deployed && built.success()).await;
        }

        check_build(&built)?;
        if !deployed {
            let failed: usize = results.iter().map(DeploymentResults::failure_count).sum();
            return Err(CommandFailure::new(
                DEPLOY_FAILURE,
                format!("{} destination(s) failed", failed),
            )
            .into());
        }
        Ok(())
    }

    fn upload_request(&self, ctx: &ProjectContext) -> anyhow::Result<UploadRequest> {
        let notes = release_notes(
            self.notes.as_deref(),
            self.notes_file.as_deref(),
            &ctx.base_dir.join(&ctx.config.changelog.output),
            ctx.config.current_version(),
        )?;

        let mut request = UploadRequest::new().with_test_groups(self.groups.clone());
        if let Some(notes) = notes {
            request = request.with_release_notes(notes);
        }
        Ok(request)
    }
}

/// Dry run: what would be uploaded where
fn print_plan(ctx: &ProjectContext, built: &SignedBuild, request: &UploadRequest) {
    println!();
    println!("{}", output::header("Deploy plan"));

    for build_output in built.build.successful() {
        let platform = build_output.platform;
        let destinations = Destination::enabled_for(platform, &ctx.config.deploy);
        if destinations.is_empty() {
            output::warning(&format!("{}: no destinations enabled", platform.display_name()));
            continue;
        }

        let names: Vec<&str> = destinations.iter().map(|d| d.display_name()).collect();
        output::info(&format!(
            "{} → {}",
            platform.display_name(),
            names.join(", ")
        ));
    }

    match &request.release_notes {
        Some(notes) => println!("{}", output::key_value("Release notes", &format!("{} chars", notes.len()))),
        None => println!("{}", output::key_value("Release notes", "none")),
    }
    if !request.test_groups.is_empty() {
        println!("{}", output::key_value("Groups", &request.test_groups.join(", ")));
    }
    println!();
    println!("{}", style("Dry run: nothing was uploaded.").yellow());
}

fn print_results(results: &[DeploymentResults], built: &SignedBuild) {
    if results.is_empty() {
        let nothing_built = built.build.successful().next().is_none();
        output::warning(if nothing_built {
            "Nothing to deploy"
        } else {
            "No destinations enabled for the built platforms"
        });
        return;
    }

    for platform_results in results {
        for result in &platform_results.individual {
            let detail = match (&result.error, &result.build_url) {
                (Some(error), _) => error.clone(),
                (None, Some(url)) => url.clone(),
                (None, None) => result.message.clone(),
            };
            output::outcome(
                result.success,
                &format!(
                    "{} → {}: {}",
                    platform_results.platform.display_name(),
                    result.destination.display_name(),
                    detail
                ),
            );
        }
        println!("  {}", output::dim_style().apply_to(platform_results.message()));
    }
}

/// Notification failures are logged, never fatal
async fn notify(ctx: &ProjectContext, version: &str, results: &[DeploymentResults], success: bool) {
    if !WebhookNotifier::should_notify(&ctx.config, success) {
        return;
    }
    let Some(notifier) = WebhookNotifier::from_config(&ctx.config) else {
        return;
    };

    let summary = deploy_summary(&ctx.config, version, results);
    match notifier.send(&summary).await {
        Ok(()) => output::info("Notification sent"),
        Err(e) => {
            warn!(error = %e, "notification failed");
            output::warning(&format!("Notification failed: {}", e));
        }
    }
}
