//! Version command - show, bump and restore the project version

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand};
use console::style;
use dialoguer::Confirm;
use tracing::{info, warn};

use launchpad_changelog::{ChangelogGenerator, CommitSource};
use launchpad_core::config::BumpStrategy;
use launchpad_core::version::{
    read_manifest, BumpRequest, FileVersionBackup, ProjectFileUpdater, VersionBumpResult,
};
use launchpad_core::{BumpLevel, VersionOrchestrator};
use launchpad_git::{GitRepo, GitTagger};

use crate::cli::context::ProjectContext;
use crate::cli::output;
use crate::cli::{BumpArg, Cli};
use crate::exit_codes::{CommandFailure, VERSION_ERROR};

/// Show, bump or restore the project version
#[derive(Debug, Args)]
pub struct VersionCommand {
    #[command(subcommand)]
    pub action: VersionAction,
}

#[derive(Debug, Subcommand)]
pub enum VersionAction {
    /// Show the current version and what each bump would produce
    Show,

    /// Bump the version in the config and every version file
    Bump {
        /// Level to bump (default: version.bump_strategy)
        #[arg(value_enum)]
        level: Option<BumpArg>,

        /// Do not snapshot files before rewriting them
        #[arg(long)]
        skip_backup: bool,

        /// Also increment build numbers (versionCode, CFBundleVersion)
        #[arg(long)]
        build_number: bool,
    },

    /// Restore version files from a backup
    Restore {
        /// Backup directory (default: the newest backup)
        backup: Option<PathBuf>,

        /// List available backups instead of restoring
        #[arg(long)]
        list: bool,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(action = ?self.action, dry_run = cli.dry_run, "executing version command");
        let ctx = ProjectContext::load(cli)?;

        match &self.action {
            VersionAction::Show => show(&ctx),
            VersionAction::Bump {
                level,
                skip_backup,
                build_number,
            } => {
                let level = resolve_level(&ctx, level.map(BumpLevel::from))?;
                let request = BumpRequest::new(level)
                    .with_dry_run(cli.dry_run)
                    .with_skip_backup(*skip_backup)
                    .with_increment_build_number(*build_number || ctx.config.version.auto_increment);
                bump(&ctx, &request)
            }
            VersionAction::Restore { backup, list, yes } => {
                if *list {
                    list_backups(&ctx)
                } else {
                    restore(&ctx, backup.as_deref(), *yes, cli.dry_run)
                }
            }
        }
    }
}

fn orchestrator(ctx: &ProjectContext) -> VersionOrchestrator {
    let version = &ctx.config.version;
    let mut backup = FileVersionBackup::new(&ctx.base_dir, &version.backup_dir)
        .with_patterns(version.files_to_update.clone());
    if let Some(path) = &ctx.config_path {
        backup = backup.with_config_path(path);
    }
    if version.tag_backups {
        backup = backup.with_tagger(Arc::new(GitTagger::new(&ctx.base_dir)));
    }

    VersionOrchestrator::new(
        Arc::new(backup),
        Arc::new(ProjectFileUpdater::new(&ctx.base_dir)),
    )
}

fn show(ctx: &ProjectContext) -> anyhow::Result<()> {
    let config = &ctx.config;
    let current = config.current_version();

    println!("{}", output::header("Version"));
    println!();
    println!(
        "{}",
        output::key_value("Current", &output::version_style().apply_to(current).to_string())
    );
    for level in [BumpLevel::Patch, BumpLevel::Minor, BumpLevel::Major] {
        println!(
            "{}",
            output::key_value(
                &format!("Next {}", level),
                &VersionOrchestrator::next_version(config, level)
            )
        );
    }
    println!(
        "{}",
        output::key_value("Strategy", &format!("{:?}", config.version.bump_strategy).to_lowercase())
    );
    println!("{}", output::key_value("Config", &ctx.source()));
    Ok(())
}

/// Level for a bump: explicit, fixed by strategy, or inferred from commits
fn resolve_level(ctx: &ProjectContext, explicit: Option<BumpLevel>) -> anyhow::Result<BumpLevel> {
    if let Some(level) = explicit {
        return Ok(level);
    }

    match ctx.config.version.bump_strategy {
        BumpStrategy::Patch => Ok(BumpLevel::Patch),
        BumpStrategy::Minor => Ok(BumpLevel::Minor),
        BumpStrategy::Major => Ok(BumpLevel::Major),
        BumpStrategy::Auto => infer_level(ctx),
        BumpStrategy::Manual => Err(CommandFailure::new(
            VERSION_ERROR,
            "no bump level given and version.bump_strategy is manual (use major, minor or patch)",
        )
        .into()),
    }
}

fn infer_level(ctx: &ProjectContext) -> anyhow::Result<BumpLevel> {
    let repo = GitRepo::discover(&ctx.base_dir)?;
    infer_level_from(&repo, ctx)
}

fn infer_level_from(source: &dyn CommitSource, ctx: &ProjectContext) -> anyhow::Result<BumpLevel> {
    let since = source.latest_tag(&ctx.config.version.tag_prefix)?;
    let commits = source.commits_since(since.as_deref())?;
    if commits.is_empty() {
        warn!(since = ?since, "no commits since last release");
    }

    let level = ChangelogGenerator::new(ctx.config.changelog.clone()).recommended_bump(&commits);
    output::info(&format!(
        "{} commit(s) since {} suggest a {} bump",
        commits.len(),
        since.as_deref().unwrap_or("the first commit"),
        level
    ));
    Ok(level)
}

fn bump(ctx: &ProjectContext, request: &BumpRequest) -> anyhow::Result<()> {
    let result = orchestrator(ctx).bump(&ctx.config, ctx.config_path.as_deref(), request);
    print_bump(&result, &ctx.base_dir);

    if !result.success {
        return Err(CommandFailure::new(
            VERSION_ERROR,
            result
                .error
                .unwrap_or_else(|| "version bump failed".to_string()),
        )
        .into());
    }
    Ok(())
}

fn print_bump(result: &VersionBumpResult, base_dir: &Path) {
    let arrow = format!(
        "{} → {}",
        result.previous_version,
        output::version_style().apply_to(&result.new_version)
    );

    if result.dry_run {
        output::info(&format!("Would bump {}", arrow));
        println!("{}", style("Dry run: no files were changed.").yellow());
        return;
    }

    if let Some(backup) = &result.backup {
        if let Some(location) = &backup.location {
            output::info(&format!(
                "Backup at {}",
                output::path_style().apply_to(display_relative(location, base_dir))
            ));
        }
        if let Some(tag) = &backup.tag {
            output::info(&format!("Tagged {}", tag));
        }
    }
    for file in &result.files_updated {
        println!("  {}", output::path_style().apply_to(display_relative(file, base_dir)));
    }

    if result.success {
        output::success(&format!("Bumped {}", arrow));
    } else {
        let stage = format!("{:?}", result.stage).to_lowercase();
        output::error(&format!("Bump stopped at the {} stage", stage));
        if !result.files_updated.is_empty() {
            output::warning("Some files were already rewritten; run `launchpad version restore` to roll back");
        }
    }
}

fn list_backups(ctx: &ProjectContext) -> anyhow::Result<()> {
    let backups = orchestrator(ctx).list_backups()?;
    if backups.is_empty() {
        output::info("No backups found");
        return Ok(());
    }

    println!("{}", output::header("Backups (newest first)"));
    for backup in backups {
        let detail = match read_manifest(&backup) {
            Ok(manifest) => format!(
                "{} ({} file(s), {})",
                manifest.version,
                manifest.files.len(),
                manifest.created_at.format("%Y-%m-%d %H:%M")
            ),
            Err(e) => format!("unreadable: {}", e),
        };
        println!(
            "  {}  {}",
            output::path_style().apply_to(display_relative(&backup, &ctx.base_dir)),
            detail
        );
    }
    Ok(())
}

fn restore(ctx: &ProjectContext, backup: Option<&Path>, yes: bool, dry_run: bool) -> anyhow::Result<()> {
    let orchestrator = orchestrator(ctx);
    let target = match backup {
        Some(path) => ctx.base_dir.join(path),
        None => orchestrator
            .list_backups()?
            .into_iter()
            .next()
            .ok_or_else(|| CommandFailure::new(VERSION_ERROR, "no backups found"))?,
    };

    let manifest = read_manifest(&target)?;
    output::info(&format!(
        "Restoring {} file(s) from version {} backup",
        manifest.files.len(),
        manifest.version
    ));

    if dry_run {
        for entry in &manifest.files {
            println!("  {}", output::path_style().apply_to(display_relative(&entry.original, &ctx.base_dir)));
        }
        println!("{}", style("Dry run: no files were restored.").yellow());
        return Ok(());
    }

    if !yes && console::user_attended() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Overwrite current files with the {} backup?", manifest.version))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Aborted.").yellow());
            return Ok(());
        }
    }

    let restored = orchestrator.restore(&target)?;
    for file in &restored {
        println!("  {}", output::path_style().apply_to(display_relative(file, &ctx.base_dir)));
    }
    output::success(&format!(
        "Restored {} file(s) to version {}",
        restored.len(),
        manifest.version
    ));
    Ok(())
}

fn display_relative(path: &Path, base_dir: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::code_for;
    use chrono::Utc;
    use launchpad_changelog::Result as ChangelogResult;
    use launchpad_git::CommitInfo;
    use tempfile::TempDir;

    struct FakeHistory {
        tag: Option<String>,
        messages: Vec<&'static str>,
    }

    impl CommitSource for FakeHistory {
        fn commits_since(&self, since: Option<&str>) -> ChangelogResult<Vec<CommitInfo>> {
            assert_eq!(since, self.tag.as_deref());
            Ok(self
                .messages
                .iter()
                .enumerate()
                .map(|(i, m)| CommitInfo::new(format!("{:040}", i), *m, "Dev", "dev@example.com", Utc::now()))
                .collect())
        }

        fn latest_tag(&self, _prefix: &str) -> ChangelogResult<Option<String>> {
            Ok(self.tag.clone())
        }
    }

    fn project(yaml: &str) -> (TempDir, ProjectContext) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("launchpad.yaml"), yaml).unwrap();
        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        (temp, ctx)
    }

    #[test]
    fn test_explicit_level_wins() {
        let (_temp, ctx) = project("version:\n  bump_strategy: major\n");
        assert_eq!(
            resolve_level(&ctx, Some(BumpLevel::Patch)).unwrap(),
            BumpLevel::Patch
        );
        assert_eq!(resolve_level(&ctx, None).unwrap(), BumpLevel::Major);
    }

    #[test]
    fn test_manual_strategy_requires_level() {
        let (_temp, ctx) = project("version:\n  bump_strategy: manual\n");
        let err = resolve_level(&ctx, None).unwrap_err();
        assert_eq!(code_for(&err), VERSION_ERROR);
    }

    #[test]
    fn test_infer_level_from_commits() {
        let (_temp, ctx) = project("app:\n  name: Rocket\n");
        let history = FakeHistory {
            tag: Some("v1.0.0".to_string()),
            messages: vec!["fix: crash on launch", "feat: dark mode"],
        };
        assert_eq!(infer_level_from(&history, &ctx).unwrap(), BumpLevel::Minor);

        let history = FakeHistory {
            tag: None,
            messages: vec!["chore: deps"],
        };
        assert_eq!(infer_level_from(&history, &ctx).unwrap(), BumpLevel::Patch);
    }

    #[test]
    fn test_bump_writes_config_and_backup() {
        let (temp, ctx) = project("app:\n  name: Rocket\nversion:\n  current: 1.2.3\n");

        bump(&ctx, &BumpRequest::new(BumpLevel::Minor)).unwrap();

        let content = std::fs::read_to_string(temp.path().join("launchpad.yaml")).unwrap();
        assert!(content.contains("1.3.0"));
        let backups = orchestrator(&ctx).list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(read_manifest(&backups[0]).unwrap().version, "1.2.3");
    }

    #[test]
    fn test_dry_run_bump_changes_nothing() {
        let yaml = "app:\n  name: Rocket\nversion:\n  current: 1.2.3\n";
        let (temp, ctx) = project(yaml);

        bump(&ctx, &BumpRequest::new(BumpLevel::Major).with_dry_run(true)).unwrap();

        let content = std::fs::read_to_string(temp.path().join("launchpad.yaml")).unwrap();
        assert_eq!(content, yaml);
        assert!(orchestrator(&ctx).list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_restore_newest_backup() {
        let (temp, ctx) = project("app:\n  name: Rocket\nversion:\n  current: 1.2.3\n");
        bump(&ctx, &BumpRequest::new(BumpLevel::Patch)).unwrap();
        let config_path = temp.path().join("launchpad.yaml");
        assert!(std::fs::read_to_string(&config_path).unwrap().contains("1.2.4"));

        restore(&ctx, None, true, false).unwrap();
        let restored = std::fs::read_to_string(&config_path).unwrap();
        assert!(restored.contains("1.2.3"));
        assert!(!restored.contains("1.2.4"));
    }

    #[test]
    fn test_restore_without_backups() {
        let (_temp, ctx) = project("app:\n  name: Rocket\n");
        let err = restore(&ctx, None, true, false).unwrap_err();
        assert_eq!(code_for(&err), VERSION_ERROR);
    }

    #[test]
    fn test_display_relative() {
        let base = Path::new("/work/app");
        assert_eq!(display_relative(Path::new("/work/app/ios/Info.plist"), base), "ios/Info.plist");
        assert_eq!(display_relative(Path::new("/elsewhere/x"), base), "/elsewhere/x");
    }
}
