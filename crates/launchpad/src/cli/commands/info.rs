//! Info command - configuration, detected platforms and destinations

use clap::Args;
use console::style;
use tracing::info;

use launchpad_core::Platform;
use launchpad_frameworks::ProjectDetector;
use launchpad_signing::SigningOrchestrator;
use launchpad_stores::Destination;

use crate::cli::context::ProjectContext;
use crate::cli::output;
use crate::cli::Cli;

/// Show configuration, detected platforms and destinations
#[derive(Debug, Args)]
pub struct InfoCommand {}

impl InfoCommand {
    /// Execute the info command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing info command");
        let ctx = ProjectContext::load(cli)?;
        let config = &ctx.config;

        println!("{}", output::header("Project"));
        println!("{}", output::key_value("Config", &ctx.source()));
        println!("{}", output::key_value("Directory", &ctx.base_dir.display().to_string()));
        println!("{}", output::key_value("App", or_unset(&config.app.name)));
        println!(
            "{}",
            output::key_value("Package", config.app.package_id.as_deref().unwrap_or("-"))
        );
        println!(
            "{}",
            output::key_value("Bundle", config.app.bundle_id.as_deref().unwrap_or("-"))
        );
        if let Some(organization) = &config.app.organization {
            println!("{}", output::key_value("Organization", organization));
        }
        println!(
            "{}",
            output::key_value(
                "Version",
                &output::version_style().apply_to(config.current_version()).to_string()
            )
        );
        println!();

        println!("{}", output::header("Platforms"));
        let detector = ProjectDetector::new();
        for platform in Platform::ALL {
            let detection = detector.detect_platform(config, &ctx.base_dir, platform);
            let enabled = config.is_platform_enabled(platform);
            let found = match &detection.root {
                Some(root) if detection.detection.detected() => format!(
                    "found in {} ({}%)",
                    root.strip_prefix(&ctx.base_dir).unwrap_or(root).display(),
                    detection.detection.confidence()
                ),
                _ => "not found".to_string(),
            };
            println!(
                "{}",
                output::key_value(
                    platform.display_name(),
                    &format!("{}, {}", if enabled { "enabled" } else { "disabled" }, found)
                )
            );
        }
        println!();

        println!("{}", output::header("Destinations"));
        let mut any = false;
        for platform in Platform::ALL {
            let destinations = Destination::enabled_for(platform, &config.deploy);
            if destinations.is_empty() {
                continue;
            }
            any = true;
            let names: Vec<&str> = destinations.iter().map(|d| d.display_name()).collect();
            println!("{}", output::key_value(platform.display_name(), &names.join(", ")));
        }
        if !any {
            println!("  {}", style("none enabled").dim());
        }
        let mut flavors: Vec<&String> = config.deploy.flavors.keys().collect();
        flavors.sort();
        if !flavors.is_empty() {
            let names: Vec<&str> = flavors.iter().map(|f| f.as_str()).collect();
            println!("{}", output::key_value("Flavors", &names.join(", ")));
        }
        println!();

        if config.is_platform_enabled(Platform::Android) {
            println!("{}", output::header("Signing"));
            let validation = SigningOrchestrator::default().validate(config, &ctx.base_dir);
            println!(
                "{}",
                output::key_value(
                    "Android",
                    &format!(
                        "{} ({})",
                        if validation.valid { "available" } else { "unavailable" },
                        validation.reason
                    )
                )
            );
            println!();
        }

        let violations = ctx.violations();
        if violations.is_empty() {
            output::success("Configuration is valid");
        } else {
            output::warning(&format!("{} configuration problem(s):", violations.len()));
            for violation in &violations {
                println!("  - {}", violation);
            }
        }
        Ok(())
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
