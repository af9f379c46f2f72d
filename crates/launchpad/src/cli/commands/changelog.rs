//! Changelog command

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use launchpad_changelog::{ChangelogFile, ChangelogGenerator, CommitSource, ReleaseNotesStore};
use launchpad_git::GitRepo;

use crate::cli::context::ProjectContext;
use crate::cli::output;
use crate::cli::Cli;

/// Generate and manage the changelog
#[derive(Debug, Args)]
pub struct ChangelogCommand {
    #[command(subcommand)]
    pub action: ChangelogAction,
}

#[derive(Debug, Subcommand)]
pub enum ChangelogAction {
    /// Generate an entry from commits and prepend it to the changelog
    Generate {
        #[command(flatten)]
        range: RangeArgs,

        /// Print the entry instead of writing the changelog
        #[arg(long)]
        stdout: bool,
    },

    /// Print the changelog, or one version's section
    Show {
        /// Version whose section to print
        #[arg(id = "show_version", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Put the changelog back as it was before the last write
    Restore,

    /// Regenerate the section of an existing version in place
    Update {
        #[command(flatten)]
        range: RangeArgs,
    },
}

/// Which commits go into an entry
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Version the entry is for (default: the current version)
    #[arg(id = "for_version", long = "for-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Start after this tag, branch or commit (default: the latest release tag)
    #[arg(long)]
    pub since: Option<String>,
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(action = ?self.action, dry_run = cli.dry_run, "executing changelog command");
        let ctx = ProjectContext::load(cli)?;
        let file = ChangelogFile::new(ctx.base_dir.join(&ctx.config.changelog.output));

        match &self.action {
            ChangelogAction::Generate { range, stdout } => {
                let repo = GitRepo::discover(&ctx.base_dir)?;
                let (version, rendered) = render(&ctx, &repo, range)?;
                if *stdout || cli.dry_run {
                    println!("{}", rendered);
                    if cli.dry_run {
                        println!("{}", style("Dry run: changelog not written.").yellow());
                    }
                    return Ok(());
                }
                file.prepend(&rendered)?;
                output::success(&format!(
                    "Added {} to {}",
                    output::version_style().apply_to(&version),
                    output::path_style().apply_to(file.path().display())
                ));
                Ok(())
            }
            ChangelogAction::Show { version } => {
                let content = match version {
                    Some(version) => file.section(version)?,
                    None => file.read()?,
                };
                println!("{}", content);
                Ok(())
            }
            ChangelogAction::Restore => {
                if cli.dry_run {
                    output::info(&format!(
                        "Would restore {} from {}",
                        file.path().display(),
                        file.backup_path().display()
                    ));
                    return Ok(());
                }
                file.restore()?;
                output::success(&format!(
                    "Restored {}",
                    output::path_style().apply_to(file.path().display())
                ));
                Ok(())
            }
            ChangelogAction::Update { range } => {
                let repo = GitRepo::discover(&ctx.base_dir)?;
                let (version, rendered) = render(&ctx, &repo, range)?;
                if cli.dry_run {
                    println!("{}", rendered);
                    println!("{}", style("Dry run: changelog not written.").yellow());
                    return Ok(());
                }
                let replaced = file.upsert(&version, &rendered)?;
                output::success(&format!(
                    "{} {} in {}",
                    if replaced { "Updated" } else { "Added" },
                    output::version_style().apply_to(&version),
                    output::path_style().apply_to(file.path().display())
                ));
                Ok(())
            }
        }
    }
}

/// Render the entry for the requested version, merged with its release notes
fn render(
    ctx: &ProjectContext,
    source: &dyn CommitSource,
    range: &RangeArgs,
) -> anyhow::Result<(String, String)> {
    let config = &ctx.config;
    let version = range
        .version
        .clone()
        .unwrap_or_else(|| config.current_version().to_string());

    let since = match &range.since {
        Some(since) => Some(since.clone()),
        None => source.latest_tag(&config.version.tag_prefix)?,
    };

    let notes_dir: PathBuf = ctx.base_dir.join(&config.changelog.release_notes_dir);
    let notes = ReleaseNotesStore::new(notes_dir).load(&version)?;

    let generator = ChangelogGenerator::new(config.changelog.clone());
    let entry = generator.generate_from(source, &version, since.as_deref(), notes.as_ref())?;
    info!(version = %version, since = ?since, sections = entry.sections.len(), "changelog entry generated");
    if entry.is_empty() {
        output::warning(&format!(
            "No changes found since {}",
            since.as_deref().unwrap_or("the first commit")
        ));
    }

    Ok((version, generator.format(&entry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use launchpad_changelog::Result as ChangelogResult;
    use launchpad_git::CommitInfo;
    use tempfile::TempDir;

    struct FakeHistory;

    impl CommitSource for FakeHistory {
        fn commits_since(&self, since: Option<&str>) -> ChangelogResult<Vec<CommitInfo>> {
            let messages = match since {
                Some("v1.0.0") => vec!["feat(login): passkeys", "fix: crash on rotate"],
                _ => vec!["chore: initial commit"],
            };
            Ok(messages
                .into_iter()
                .enumerate()
                .map(|(i, m)| CommitInfo::new(format!("{:040}", i), m, "Ana", "ana@example.com", Utc::now()))
                .collect())
        }

        fn latest_tag(&self, prefix: &str) -> ChangelogResult<Option<String>> {
            Ok(Some(format!("{}1.0.0", prefix)))
        }
    }

    fn project() -> (TempDir, ProjectContext) {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            "app:\n  name: Rocket\nversion:\n  current: 1.1.0\n",
        )
        .unwrap();
        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        (temp, ctx)
    }

    #[test]
    fn test_render_since_latest_tag() {
        let (_temp, ctx) = project();
        let range = RangeArgs {
            version: None,
            since: None,
        };

        let (version, rendered) = render(&ctx, &FakeHistory, &range).unwrap();
        assert_eq!(version, "1.1.0");
        assert!(rendered.contains("1.1.0"));
        assert!(rendered.contains("passkeys"));
        assert!(rendered.contains("crash on rotate"));
    }

    #[test]
    fn test_render_explicit_range_and_notes() {
        let (temp, ctx) = project();
        let notes_dir = temp.path().join(".launchpad/release-notes");
        std::fs::create_dir_all(&notes_dir).unwrap();
        std::fs::write(
            notes_dir.join("2.0.0.yaml"),
            "highlights:\n  - Brand new onboarding\n",
        )
        .unwrap();

        let range = RangeArgs {
            version: Some("2.0.0".to_string()),
            since: Some("main~10".to_string()),
        };
        let (version, rendered) = render(&ctx, &FakeHistory, &range).unwrap();
        assert_eq!(version, "2.0.0");
        assert!(rendered.contains("initial commit"));
        assert!(rendered.contains("Brand new onboarding"));
    }

    #[test]
    fn test_render_links_commits_to_repo() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            "app:\n  name: Rocket\nversion:\n  current: 1.1.0\nchangelog:\n  repo_url: https://github.com/acme/rocket\n",
        )
        .unwrap();
        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        let range = RangeArgs {
            version: None,
            since: None,
        };

        let (_, rendered) = render(&ctx, &FakeHistory, &range).unwrap();
        assert!(rendered.contains("](https://github.com/acme/rocket/commit/"));
    }
}
