//! Configuration and working directory shared by every command

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use launchpad_core::config::{find_config, load_config};
use launchpad_core::{Config, ConfigViolation, Platform};
use launchpad_frameworks::validate_for_project;

use crate::cli::{output, Cli};
use crate::exit_codes::{CommandFailure, CONFIG_ERROR};

/// Loaded project: its configuration, where it came from, and the base directory
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub config: Config,
    /// Configuration file, `None` when running on defaults
    pub config_path: Option<PathBuf>,
    /// Directory builds, backups and reports are relative to
    pub base_dir: PathBuf,
}

impl ProjectContext {
    /// Load the project for a CLI invocation.
    ///
    /// `--config` must point at a readable file. Otherwise the configuration is
    /// discovered from the working directory; a missing file means defaults,
    /// but a file that fails to parse is an error.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd, cli.config.as_deref())
    }

    pub fn load_from(base_dir: &Path, explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => Some(base_dir.join(path)),
            None => find_config(base_dir),
        };

        let config = match &config_path {
            Some(path) => load_config(path)?,
            None => {
                info!(dir = %base_dir.display(), "no config file found, using defaults");
                Config::default()
            }
        };
        debug!(config = ?config_path, "project loaded");

        Ok(Self {
            config,
            config_path,
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Human-readable source of the configuration
    pub fn source(&self) -> String {
        match &self.config_path {
            Some(path) => path.display().to_string(),
            None => "defaults (no config file)".to_string(),
        }
    }

    /// Apply a `deploy.flavors` group: destination overrides plus the build
    /// flavor of its platform. Returns the group's platform.
    pub fn apply_flavor(&mut self, name: &str) -> anyhow::Result<Platform> {
        let Some(group) = self.config.deploy.flavors.get(name).cloned() else {
            let mut known: Vec<&str> = self.config.deploy.flavors.keys().map(String::as_str).collect();
            known.sort_unstable();
            return Err(CommandFailure::new(
                CONFIG_ERROR,
                format!(
                    "unknown flavor group '{}' (known: {})",
                    name,
                    if known.is_empty() { "none".to_string() } else { known.join(", ") }
                ),
            )
            .into());
        };

        if let Some(deploy) = self.config.deploy.with_flavor(name) {
            self.config.deploy = deploy;
        }
        if group.platform == Platform::Android {
            if let Some(flavor) = group.build_flavor.filter(|f| !f.is_empty()) {
                self.config.build.android.flavor = Some(flavor);
            }
        }
        debug!(flavor = name, platform = %group.platform, "flavor group applied");
        Ok(group.platform)
    }

    /// Every configuration problem, including enabled platforms missing on disk
    pub fn violations(&self) -> Vec<ConfigViolation> {
        validate_for_project(&self.config, &self.base_dir)
    }

    /// Fail with the configuration exit code when any violation is reported.
    ///
    /// All violations are printed so they can be fixed in one pass.
    pub fn ensure_valid(&self) -> anyhow::Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            return Ok(());
        }

        for violation in &violations {
            output::error(&violation.to_string());
        }
        Err(CommandFailure::new(
            CONFIG_ERROR,
            format!("configuration has {} problem(s)", violations.len()),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::code_for;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        assert!(ctx.config_path.is_none());
        assert!(ctx.source().starts_with("defaults"));
        assert_eq!(ctx.config.current_version(), "0.1.0");
    }

    #[test]
    fn test_discovers_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            "app:\n  name: Rocket\nversion:\n  current: 2.0.0\n",
        )
        .unwrap();

        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        assert_eq!(ctx.config.app.name, "Rocket");
        assert_eq!(ctx.config.current_version(), "2.0.0");
        assert_eq!(ctx.config_path, Some(temp.path().join("launchpad.yaml")));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("launchpad.yaml"), "app: [unclosed\n").unwrap();

        let err = ProjectContext::load_from(temp.path(), None).unwrap_err();
        assert_eq!(code_for(&err), CONFIG_ERROR);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let err = ProjectContext::load_from(temp.path(), Some(Path::new("missing.yaml"))).unwrap_err();
        assert_eq!(code_for(&err), CONFIG_ERROR);
    }

    #[test]
    fn test_apply_flavor() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            r#"
app:
  name: Rocket
deploy:
  android:
    firebase:
      enabled: true
      app_id: "1:1:android:prod"
      groups: [qa]
  flavors:
    staging:
      platform: android
      build_flavor: staging
      firebase_app_id: "1:1:android:staging"
      firebase_groups: [internal]
"#,
        )
        .unwrap();

        let mut ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        let platform = ctx.apply_flavor("staging").unwrap();
        assert_eq!(platform, Platform::Android);
        assert_eq!(ctx.config.build.android.flavor.as_deref(), Some("staging"));
        assert_eq!(ctx.config.deploy.android.firebase.app_id, "1:1:android:staging");
        assert_eq!(ctx.config.deploy.android.firebase.groups, vec!["internal".to_string()]);

        let err = ctx.apply_flavor("prod").unwrap_err();
        assert_eq!(code_for(&err), CONFIG_ERROR);
        assert!(err.to_string().contains("known: staging"));
    }

    #[test]
    fn test_ensure_valid_reports_config_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("launchpad.yaml"),
            "app:\n  name: Rocket\nbuild:\n  android:\n    enabled: true\n",
        )
        .unwrap();

        let ctx = ProjectContext::load_from(temp.path(), None).unwrap();
        // package_id is missing and no Gradle project exists
        assert!(ctx.violations().len() >= 2);
        let err = ctx.ensure_valid().unwrap_err();
        assert_eq!(code_for(&err), CONFIG_ERROR);
    }
}
