//! Default configuration values

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "launchpad.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "launchpad.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".launchpad.yaml";

/// Directory for tool state (backups, reports, release notes)
pub const STATE_DIR: &str = ".launchpad";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        "launchpad.yml",
        ALT_CONFIG_FILE,
        DEFAULT_CONFIG_TOML,
    ]
}
