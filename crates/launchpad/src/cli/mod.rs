//! CLI definition and command handling

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use launchpad_core::{BumpLevel, Platform};

use commands::{BuildCommand, ChangelogCommand, DeployCommand, InfoCommand, VersionCommand};

/// Launchpad - build, sign, version and ship mobile apps
#[derive(Debug, Parser)]
#[command(name = "launchpad")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show what would happen without building, uploading or writing files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (skips discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build (and sign) the enabled platforms
    Build(BuildCommand),

    /// Build, sign and upload to every enabled destination
    Deploy(DeployCommand),

    /// Show, bump or restore the project version
    Version(VersionCommand),

    /// Generate and manage the changelog
    Changelog(ChangelogCommand),

    /// Show configuration, detected platforms and destinations
    Info(InfoCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Build(ref cmd) => cmd.execute(&self),
            Commands::Deploy(ref cmd) => cmd.execute(&self),
            Commands::Version(ref cmd) => cmd.execute(&self),
            Commands::Changelog(ref cmd) => cmd.execute(&self),
            Commands::Info(ref cmd) => cmd.execute(&self),
        }
    }
}

/// Platform argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Android,
    Ios,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Android => Platform::Android,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

/// Bump level argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BumpArg {
    Major,
    Minor,
    Patch,
}

impl From<BumpArg> for BumpLevel {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Major => BumpLevel::Major,
            BumpArg::Minor => BumpLevel::Minor,
            BumpArg::Patch => BumpLevel::Patch,
        }
    }
}

/// Convert a platform list argument, `None` when empty
pub fn platforms_from(args: &[PlatformArg]) -> Option<Vec<Platform>> {
    if args.is_empty() {
        None
    } else {
        Some(args.iter().map(|p| Platform::from(*p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["launchpad", "build", "--dry-run", "-v", "-p", "android"])
            .unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        match cli.command {
            Commands::Build(cmd) => assert_eq!(cmd.platform, vec![PlatformArg::Android]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_version_bump_level_is_optional() {
        let cli = Cli::try_parse_from(["launchpad", "version", "bump"]).unwrap();
        assert!(matches!(cli.command, Commands::Version(_)));

        let cli = Cli::try_parse_from(["launchpad", "version", "bump", "minor"]).unwrap();
        assert!(matches!(cli.command, Commands::Version(_)));

        assert!(Cli::try_parse_from(["launchpad", "version", "bump", "huge"]).is_err());
    }

    #[test]
    fn test_deploy_flavor() {
        let cli = Cli::try_parse_from(["launchpad", "deploy", "--flavor", "staging"]).unwrap();
        match cli.command {
            Commands::Deploy(cmd) => assert_eq!(cmd.flavor.as_deref(), Some("staging")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_platforms_from() {
        assert!(platforms_from(&[]).is_none());
        assert_eq!(
            platforms_from(&[PlatformArg::Ios]),
            Some(vec![Platform::Ios])
        );
    }
}
