//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, STATE_DIR};
use super::types::Config;
use super::validation::validate;

/// Load configuration from a file without validating it
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if is_toml(path) { "TOML" } else { "YAML" };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load configuration from a file and reject it if validation reports any violation
pub fn load_and_validate(path: &Path) -> Result<Config> {
    let config = load_config(path)?;
    let violations = validate(&config);
    if !violations.is_empty() {
        return Err(ConfigError::Invalid(violations).into());
    }
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`             (e.g. `launchpad.yaml`)
///   2. `<dir>/.launchpad/<name>`  (e.g. `.launchpad/launchpad.yaml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let nested = current.join(STATE_DIR).join(name);
            if nested.is_file() {
                info!(path = %nested.display(), "found config file in {}/", STATE_DIR);
                return Some(nested);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration or use defaults.
///
/// A missing file is not an error. A file that exists but fails to parse is
/// reported and replaced by defaults as well.
pub fn load_config_or_default(dir: &Path) -> (Config, Option<PathBuf>) {
    match load_config_from_dir(dir) {
        Ok((config, path)) => (config, Some(path)),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "no usable config found, using defaults");
            (Config::default(), None)
        }
    }
}

pub(crate) fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("launchpad.yaml");
        std::fs::write(&config_path, "app:\n  name: Demo\n").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_yaml_over_toml() {
        let temp = TempDir::new().unwrap();
        let yaml_path = temp.path().join("launchpad.yaml");
        let toml_path = temp.path().join("launchpad.toml");
        std::fs::write(&yaml_path, "app:\n  name: Demo\n").unwrap();
        std::fs::write(&toml_path, "[app]\nname = \"Demo\"\n").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, yaml_path);
    }

    #[test]
    fn test_find_config_in_state_dir() {
        let temp = TempDir::new().unwrap();
        let state_dir = temp.path().join(".launchpad");
        std::fs::create_dir_all(&state_dir).unwrap();
        let config_path = state_dir.join("launchpad.yaml");
        std::fs::write(&config_path, "app:\n  name: Demo\n").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("launchpad.yaml");
        std::fs::write(&config_path, "app:\n  name: Demo\n").unwrap();
        let nested = temp.path().join("android").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("launchpad.yaml");
        std::fs::write(
            &config_path,
            "app:\n  name: Demo\n  package_id: com.example.demo\nbuild:\n  android:\n    enabled: true\n    flavor: prod\nversion:\n  current: 1.4.2\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.app.name, "Demo");
        assert!(config.build.android.enabled);
        assert_eq!(config.build.android.flavor.as_deref(), Some("prod"));
        assert_eq!(config.version.current, "1.4.2");
        assert_eq!(config.build.android.build_type, "release");
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("launchpad.toml");
        std::fs::write(
            &config_path,
            "[app]\nname = \"Demo\"\n\n[version]\ncurrent = \"2.0.0\"\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.current_version(), "2.0.0");
    }

    #[test]
    fn test_load_and_validate_reports_all() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("launchpad.yaml");
        std::fs::write(&config_path, "build:\n  android:\n    enabled: true\n").unwrap();

        let err = load_and_validate(&config_path).unwrap_err();
        match err {
            crate::LaunchpadError::Config(ConfigError::Invalid(violations)) => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path());
        if path.is_none() {
            assert_eq!(config.version.current, "0.1.0");
        }
    }
}
