//! Signing credential resolution
//!
//! Credentials are resolved from the pipeline config at validation time.
//! Passwords come from the environment (config overlay first) or from the
//! Android `key.properties` file and are never written back anywhere.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use launchpad_core::Config;

/// APK signature schemes to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureSchemes {
    pub v1: bool,
    pub v2: bool,
    pub v3: bool,
    pub v4: bool,
}

impl SignatureSchemes {
    /// Only the legacy JAR scheme is enabled
    pub fn is_v1_only(&self) -> bool {
        self.v1 && !self.v2 && !self.v3 && !self.v4
    }

    /// At least one scheme is enabled
    pub fn any(&self) -> bool {
        self.v1 || self.v2 || self.v3 || self.v4
    }
}

impl Default for SignatureSchemes {
    fn default() -> Self {
        Self {
            v1: true,
            v2: true,
            v3: true,
            v4: false,
        }
    }
}

/// Fully resolved signing credentials
#[derive(Clone)]
pub struct SigningConfig {
    /// Keystore file
    pub keystore_path: PathBuf,
    /// Key alias inside the keystore
    pub key_alias: String,
    /// Keystore password
    pub store_password: String,
    /// Key password
    pub key_password: String,
    /// APK signature schemes
    pub schemes: SignatureSchemes,
    /// Android SDK root used to locate build tools
    pub sdk_root: Option<PathBuf>,
    /// JDK home used to locate `jarsigner`
    pub java_home: Option<PathBuf>,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("keystore_path", &self.keystore_path)
            .field("key_alias", &self.key_alias)
            .field("store_password", &"<redacted>")
            .field("key_password", &"<redacted>")
            .field("schemes", &self.schemes)
            .field("sdk_root", &self.sdk_root)
            .field("java_home", &self.java_home)
            .finish()
    }
}

/// Outcome of credential validation. This is the only gate before signing.
#[derive(Debug, Clone)]
pub struct SigningValidation {
    /// Whether signing can proceed
    pub valid: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Resolved credentials when valid
    pub config: Option<SigningConfig>,
}

impl SigningValidation {
    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: reason.into(),
            config: None,
        }
    }

    fn valid(config: SigningConfig) -> Self {
        Self {
            valid: true,
            reason: format!(
                "keystore {} with alias '{}'",
                config.keystore_path.display(),
                config.key_alias
            ),
            config: Some(config),
        }
    }
}

/// Resolve signing credentials for the Android build in `base_dir`.
///
/// Nothing is executed; only the keystore's existence is checked on disk.
pub fn resolve_signing(config: &Config, base_dir: &Path) -> SigningValidation {
    let android = &config.build.android;
    let signing = &android.signing;

    if !signing.enabled {
        return SigningValidation::invalid("signing is disabled in build.android.signing");
    }

    let project_dir = base_dir.join(&android.project_dir);
    let properties_path = project_dir.join(&signing.key_properties);
    let properties = if signing.use_env_for_passwords {
        HashMap::new()
    } else {
        match read_key_properties(&properties_path) {
            Some(props) => props,
            None => {
                return SigningValidation::invalid(format!(
                    "key properties file {} not found",
                    properties_path.display()
                ))
            }
        }
    };

    let Some(keystore) = signing
        .keystore
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .or_else(|| properties.get("storeFile").cloned())
    else {
        return SigningValidation::invalid("no keystore configured (build.android.signing.keystore)");
    };

    let keystore_path = resolve_path(&keystore, base_dir);
    if !keystore_path.is_file() {
        return SigningValidation::invalid(format!(
            "keystore {} does not exist",
            keystore_path.display()
        ));
    }

    let Some(key_alias) = signing
        .key_alias
        .clone()
        .or_else(|| properties.get("keyAlias").cloned())
        .filter(|a| !a.trim().is_empty())
    else {
        return SigningValidation::invalid("no key alias configured (build.android.signing.key_alias)");
    };

    let (store_password, key_password) = if signing.use_env_for_passwords {
        let Some(store) = config.env_var(&signing.store_password_env) else {
            return SigningValidation::invalid(format!(
                "keystore password not set (export {})",
                signing.store_password_env
            ));
        };
        let key = config
            .env_var(&signing.key_password_env)
            .unwrap_or_else(|| store.clone());
        (store, key)
    } else {
        let Some(store) = properties.get("storePassword").cloned() else {
            return SigningValidation::invalid(format!(
                "storePassword missing from {}",
                properties_path.display()
            ));
        };
        let key = properties
            .get("keyPassword")
            .cloned()
            .unwrap_or_else(|| store.clone());
        (store, key)
    };

    let schemes = SignatureSchemes {
        v1: signing.v1_signing,
        v2: signing.v2_signing,
        v3: signing.v3_signing,
        v4: signing.v4_signing,
    };
    if !schemes.any() {
        return SigningValidation::invalid("every APK signature scheme is disabled");
    }

    let sdk_root = config
        .env_var("ANDROID_HOME")
        .or_else(|| config.env_var("ANDROID_SDK_ROOT"))
        .map(PathBuf::from);
    let java_home = config.env_var("JAVA_HOME").map(PathBuf::from);

    debug!(keystore = %keystore_path.display(), alias = %key_alias, "signing credentials resolved");

    SigningValidation::valid(SigningConfig {
        keystore_path,
        key_alias,
        store_password,
        key_password,
        schemes,
        sdk_root,
        java_home,
    })
}

/// Parse a Gradle-style `key.properties` file
pub fn read_key_properties(path: &Path) -> Option<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(parse_properties(&content))
}

fn parse_properties(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
        .filter_map(|l| {
            let (key, value) = l.split_once('=').or_else(|| l.split_once(':'))?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn resolve_path(raw: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
