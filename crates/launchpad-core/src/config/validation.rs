//! Configuration validation
//!
//! Validation is a pure function over a [`Config`] value. It never stops at the
//! first problem so that every violation can be fixed in one pass.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{AppStoreConnectAuth, Config, FirebaseDestination};
use crate::types::Platform;

static VERSION_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+){0,2}([-+].*)?$").expect("valid version shape regex")
});

/// A single configuration problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigViolation {
    /// Dotted path of the offending field
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl ConfigViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every violation found
pub fn validate(config: &Config) -> Vec<ConfigViolation> {
    let mut violations = Vec::new();

    validate_app(config, &mut violations);
    validate_build(config, &mut violations);
    validate_version(config, &mut violations);
    validate_changelog(config, &mut violations);
    validate_deploy(config, &mut violations);

    debug!(count = violations.len(), "config validated");
    violations
}

fn validate_app(config: &Config, out: &mut Vec<ConfigViolation>) {
    if config.app.name.trim().is_empty() && !config.enabled_platforms().is_empty() {
        out.push(ConfigViolation::new(
            "app.name",
            "required when a platform is enabled",
        ));
    }

    if config.build.android.enabled && is_blank(config.app.package_id.as_deref()) {
        out.push(ConfigViolation::new(
            "app.package_id",
            "required when Android is enabled",
        ));
    }

    if config.build.ios.enabled && is_blank(config.app.bundle_id.as_deref()) {
        out.push(ConfigViolation::new(
            "app.bundle_id",
            "required when iOS is enabled",
        ));
    }
}

fn validate_build(config: &Config, out: &mut Vec<ConfigViolation>) {
    let android = &config.build.android;
    if android.enabled && android.build_type.trim().is_empty() {
        out.push(ConfigViolation::new(
            "build.android.build_type",
            "must not be empty",
        ));
    }

    let signing = &android.signing;
    if android.enabled && signing.enabled && signing.keystore.is_some() {
        if is_blank(signing.key_alias.as_deref()) {
            out.push(ConfigViolation::new(
                "build.android.signing.key_alias",
                "required when a keystore is configured",
            ));
        }
        if signing.use_env_for_passwords && signing.store_password_env.trim().is_empty() {
            out.push(ConfigViolation::new(
                "build.android.signing.store_password_env",
                "must name an environment variable",
            ));
        }
    }

    let ios = &config.build.ios;
    if ios.enabled && ios.scheme.trim().is_empty() {
        out.push(ConfigViolation::new(
            "build.ios.scheme",
            "required when iOS is enabled",
        ));
    }
}

fn validate_version(config: &Config, out: &mut Vec<ConfigViolation>) {
    let current = config.current_version();
    if !VERSION_SHAPE.is_match(current) {
        out.push(ConfigViolation::new(
            "version.current",
            format!("'{}' is not a MAJOR.MINOR.PATCH version", current),
        ));
    }

    for (i, pattern) in config.version.files_to_update.iter().enumerate() {
        if pattern.trim().is_empty() {
            out.push(ConfigViolation::new(
                format!("version.files_to_update[{}]", i),
                "must not be empty",
            ));
        } else if let Err(e) = glob::Pattern::new(pattern) {
            out.push(ConfigViolation::new(
                format!("version.files_to_update[{}]", i),
                format!("invalid pattern: {}", e),
            ));
        }
    }
}

fn validate_changelog(config: &Config, out: &mut Vec<ConfigViolation>) {
    if config.changelog.output.as_os_str().is_empty() {
        out.push(ConfigViolation::new("changelog.output", "must not be empty"));
    }

    if let Some(url) = &config.changelog.repo_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            out.push(ConfigViolation::new(
                "changelog.repo_url",
                "must be an http(s) URL",
            ));
        }
    }

    for (key, ty) in &config.changelog.types {
        if key.trim().is_empty() {
            out.push(ConfigViolation::new(
                "changelog.types",
                "commit type keys must not be empty",
            ));
        } else if ty.title.trim().is_empty() {
            out.push(ConfigViolation::new(
                format!("changelog.types.{}.title", key),
                "must not be empty",
            ));
        }
    }
}

fn validate_deploy(config: &Config, out: &mut Vec<ConfigViolation>) {
    let deploy = &config.deploy;

    for platform in Platform::ALL {
        if deploy.has_destinations(platform) && !config.is_platform_enabled(platform) {
            out.push(ConfigViolation::new(
                format!("deploy.{}", platform),
                format!(
                    "destinations are enabled but build.{}.enabled is false",
                    platform
                ),
            ));
        }
    }

    validate_firebase("deploy.android.firebase", &deploy.android.firebase, out);
    validate_firebase("deploy.ios.firebase", &deploy.ios.firebase, out);

    let play = &deploy.android.play_console;
    if play.enabled {
        if play.service_account.is_none() && config.env_var(&play.service_account_env).is_none()
        {
            out.push(ConfigViolation::new(
                "deploy.android.play_console.service_account",
                format!(
                    "required (or set {} in the environment)",
                    play.service_account_env
                ),
            ));
        }
        if play.track.trim().is_empty() {
            out.push(ConfigViolation::new(
                "deploy.android.play_console.track",
                "must not be empty",
            ));
        }
        if !(play.rollout > 0.0 && play.rollout <= 1.0) {
            out.push(ConfigViolation::new(
                "deploy.android.play_console.rollout",
                "must be in the range (0, 1]",
            ));
        }
    }

    if deploy.ios.testflight.enabled {
        validate_asc_auth("deploy.ios.testflight", &deploy.ios.testflight.auth, config, out);
    }
    if deploy.ios.app_store.enabled {
        validate_asc_auth("deploy.ios.app_store", &deploy.ios.app_store.auth, config, out);
    }

    let mut flavor_names: Vec<_> = deploy.flavors.keys().collect();
    flavor_names.sort();
    for name in flavor_names {
        let group = &deploy.flavors[name];
        if !config.is_platform_enabled(group.platform) {
            out.push(ConfigViolation::new(
                format!("deploy.flavors.{}.platform", name),
                format!("references disabled platform {}", group.platform),
            ));
        }
    }

    if deploy.timeout_secs == 0 {
        out.push(ConfigViolation::new(
            "deploy.timeout_secs",
            "must be greater than zero",
        ));
    }
}

fn validate_firebase(field: &str, firebase: &FirebaseDestination, out: &mut Vec<ConfigViolation>) {
    if firebase.enabled && firebase.app_id.trim().is_empty() {
        out.push(ConfigViolation::new(
            format!("{}.app_id", field),
            "required when Firebase is enabled",
        ));
    }
}

fn validate_asc_auth(
    field: &str,
    auth: &AppStoreConnectAuth,
    config: &Config,
    out: &mut Vec<ConfigViolation>,
) {
    let checks = [
        ("api_key_id", auth.api_key_id.is_some(), "APP_STORE_CONNECT_KEY_ID"),
        ("issuer_id", auth.issuer_id.is_some(), "APP_STORE_CONNECT_ISSUER_ID"),
        (
            "api_key_path",
            auth.api_key_path.is_some(),
            "APP_STORE_CONNECT_KEY_PATH",
        ),
    ];

    for (name, present, env) in checks {
        if !present && config.env_var(env).is_none() {
            out.push(ConfigViolation::new(
                format!("{}.{}", field, name),
                format!("required (or set {} in the environment)", env),
            ));
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
