//! Configuration types

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Platform;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application identity
    pub app: AppConfig,

    /// Per-platform build settings
    pub build: BuildConfig,

    /// Versioning configuration
    pub version: VersionConfig,

    /// Changelog configuration
    pub changelog: ChangelogConfig,

    /// Per-platform distribution settings
    pub deploy: DeployConfig,

    /// Post-deploy notifications
    pub notify: NotifyConfig,

    /// Deployment reports
    pub report: ReportConfig,

    /// Environment overlay, consulted before the process environment
    pub env: HashMap<String, String>,
}

impl Config {
    /// Whether a platform may be targeted. A platform is buildable only when its
    /// build section enables it; deploy settings alone never make it buildable.
    pub fn is_platform_enabled(&self, platform: Platform) -> bool {
        match platform {
            Platform::Android => self.build.android.enabled,
            Platform::Ios => self.build.ios.enabled,
        }
    }

    /// Platforms with `build.<platform>.enabled == true`
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_platform_enabled(*p))
            .collect()
    }

    /// Look up a variable in the overlay first, then in the process environment
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|v| !v.is_empty())
    }

    /// The version currently recorded for the project
    pub fn current_version(&self) -> &str {
        if !self.version.current.is_empty() {
            &self.version.current
        } else if let Some(ref v) = self.app.version {
            v
        } else {
            "0.0.0"
        }
    }
}

/// Application identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Display name
    pub name: String,

    /// Android applicationId
    pub package_id: Option<String>,

    /// iOS bundle identifier
    pub bundle_id: Option<String>,

    /// Organization or team name
    pub organization: Option<String>,

    /// Marketing version, used when `version.current` is empty
    pub version: Option<String>,
}

/// Per-platform build settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Android build settings
    pub android: AndroidBuildConfig,

    /// iOS build settings
    pub ios: IosBuildConfig,
}

/// Android packaging format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidArtifact {
    /// Android App Bundle
    #[default]
    Aab,
    /// Android Package
    Apk,
}

impl AndroidArtifact {
    /// File extension of the produced artifact
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aab => "aab",
            Self::Apk => "apk",
        }
    }
}

/// Android build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidBuildConfig {
    /// Whether Android may be built
    pub enabled: bool,

    /// Gradle project directory relative to the base directory
    pub project_dir: PathBuf,

    /// Gradle build type
    pub build_type: String,

    /// Product flavor
    pub flavor: Option<String>,

    /// Artifact to produce
    pub artifact: AndroidArtifact,

    /// Extra arguments passed to Gradle
    pub gradle_args: Vec<String>,

    /// Signing settings
    pub signing: AndroidSigningConfig,
}

impl Default for AndroidBuildConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_dir: PathBuf::from("android"),
            build_type: "release".to_string(),
            flavor: None,
            artifact: AndroidArtifact::Aab,
            gradle_args: Vec::new(),
            signing: AndroidSigningConfig::default(),
        }
    }
}

impl AndroidBuildConfig {
    /// Gradle task for the current settings, e.g. `bundleProdRelease`.
    ///
    /// Computed from the current field values on every call.
    pub fn gradle_task(&self) -> String {
        let verb = match self.artifact {
            AndroidArtifact::Aab => "bundle",
            AndroidArtifact::Apk => "assemble",
        };
        format!("{}{}", verb, self.variant_name_capitalized())
    }

    /// Variant name as Gradle spells it, e.g. `prodRelease`
    pub fn variant_name(&self) -> String {
        match self.flavor.as_deref().filter(|f| !f.is_empty()) {
            Some(flavor) => format!("{}{}", flavor, capitalize(&self.build_type)),
            None => self.build_type.clone(),
        }
    }

    fn variant_name_capitalized(&self) -> String {
        capitalize(&self.variant_name())
    }
}

/// Capitalize the first character of a string
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Android signing configuration. Passwords are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidSigningConfig {
    /// Whether built artifacts should be signed
    pub enabled: bool,

    /// Path to keystore file
    pub keystore: Option<PathBuf>,

    /// Key alias in keystore
    pub key_alias: Option<String>,

    /// Resolve passwords from the environment (otherwise from `key_properties`)
    pub use_env_for_passwords: bool,

    /// Environment variable holding the keystore password
    pub store_password_env: String,

    /// Environment variable holding the key password
    pub key_password_env: String,

    /// Gradle-style key.properties file, relative to the Android project directory
    pub key_properties: PathBuf,

    /// APK signature scheme v1 (JAR signing)
    pub v1_signing: bool,

    /// APK signature scheme v2
    pub v2_signing: bool,

    /// APK signature scheme v3
    pub v3_signing: bool,

    /// APK signature scheme v4
    pub v4_signing: bool,
}

impl Default for AndroidSigningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keystore: None,
            key_alias: None,
            use_env_for_passwords: true,
            store_password_env: "ANDROID_KEYSTORE_PASSWORD".to_string(),
            key_password_env: "ANDROID_KEY_PASSWORD".to_string(),
            key_properties: PathBuf::from("key.properties"),
            v1_signing: true,
            v2_signing: true,
            v3_signing: true,
            v4_signing: false,
        }
    }
}

/// iOS build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IosBuildConfig {
    /// Whether iOS may be built
    pub enabled: bool,

    /// Directory containing the Xcode project
    pub project_dir: PathBuf,

    /// Workspace file name (preferred over `project`)
    pub workspace: Option<String>,

    /// Project file name
    pub project: Option<String>,

    /// Scheme to archive
    pub scheme: String,

    /// Build configuration
    pub configuration: String,

    /// Export method (app-store, ad-hoc, enterprise, development)
    pub export_method: String,

    /// Custom ExportOptions.plist
    pub export_options_plist: Option<PathBuf>,

    /// Apple developer team ID
    pub team_id: Option<String>,
}

impl Default for IosBuildConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_dir: PathBuf::from("ios"),
            workspace: None,
            project: None,
            scheme: "Runner".to_string(),
            configuration: "Release".to_string(),
            export_method: "app-store".to_string(),
            export_options_plist: None,
            team_id: None,
        }
    }
}

/// How the next version is chosen when no level is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    /// A level must always be given explicitly
    #[default]
    Manual,
    /// Always bump the patch component
    Patch,
    /// Always bump the minor component
    Minor,
    /// Always bump the major component
    Major,
    /// Infer from conventional commits since the last release tag
    Auto,
}

/// Versioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Current version string
    pub current: String,

    /// Increment build numbers (versionCode / CFBundleVersion) with every bump
    pub auto_increment: bool,

    /// Bump strategy used when no explicit level is given
    pub bump_strategy: BumpStrategy,

    /// Files (or glob patterns) whose version references are rewritten
    pub files_to_update: Vec<String>,

    /// Directory for version backups, relative to the base directory
    pub backup_dir: PathBuf,

    /// Create a lightweight git tag with each backup
    pub tag_backups: bool,

    /// Prefix of release tags (`v1.2.3`)
    pub tag_prefix: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            current: "0.1.0".to_string(),
            auto_increment: false,
            bump_strategy: BumpStrategy::Manual,
            files_to_update: Vec::new(),
            backup_dir: PathBuf::from(".launchpad/backups"),
            tag_backups: false,
            tag_prefix: "v".to_string(),
        }
    }
}

/// Changelog output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogFormat {
    /// Markdown
    #[default]
    Markdown,
    /// JSON document
    Json,
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Output format
    pub format: ChangelogFormat,

    /// Changelog file path
    pub output: PathBuf,

    /// Render the breaking changes section
    pub include_breaking_changes: bool,

    /// Render the contributors section
    pub include_contributors: bool,

    /// Render commit statistics
    pub include_stats: bool,

    /// Include short commit hashes
    pub include_hashes: bool,

    /// Include author names per entry
    pub include_authors: bool,

    /// Include merge commits
    pub include_merges: bool,

    /// Repository web URL; when set, commit hashes link to `<repo_url>/commit/<hash>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    /// Directory of manually authored release notes (`<version>.yaml`)
    pub release_notes_dir: PathBuf,

    /// Commit type taxonomy; empty means the built-in defaults
    pub types: HashMap<String, CommitTypeConfig>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            format: ChangelogFormat::Markdown,
            output: PathBuf::from("CHANGELOG.md"),
            include_breaking_changes: true,
            include_contributors: true,
            include_stats: false,
            include_hashes: true,
            include_authors: false,
            include_merges: false,
            repo_url: None,
            release_notes_dir: PathBuf::from(".launchpad/release-notes"),
            types: HashMap::new(),
        }
    }
}

/// Configuration for a commit type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitTypeConfig {
    /// Section title
    pub title: String,

    /// Emoji shown before the title
    pub emoji: Option<String>,

    /// Whether to hide from changelog
    pub hidden: bool,
}

/// Per-platform distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Android destinations
    pub android: AndroidDeployConfig,

    /// iOS destinations
    pub ios: IosDeployConfig,

    /// Named flavor groups
    pub flavors: HashMap<String, FlavorGroup>,

    /// Per-destination network timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            android: AndroidDeployConfig::default(),
            ios: IosDeployConfig::default(),
            flavors: HashMap::new(),
            timeout_secs: 600,
        }
    }
}

impl DeployConfig {
    /// Whether any destination is enabled for the platform
    pub fn has_destinations(&self, platform: Platform) -> bool {
        match platform {
            Platform::Android => self.android.firebase.enabled || self.android.play_console.enabled,
            Platform::Ios => {
                self.ios.testflight.enabled || self.ios.app_store.enabled || self.ios.firebase.enabled
            }
        }
    }

    /// Apply a named flavor group on top of the platform defaults.
    ///
    /// Returns `None` when the group does not exist.
    pub fn with_flavor(&self, name: &str) -> Option<DeployConfig> {
        let group = self.flavors.get(name)?;
        let mut resolved = self.clone();

        match group.platform {
            Platform::Android => {
                if let Some(ref groups) = group.firebase_groups {
                    resolved.android.firebase.groups = groups.clone();
                }
                if let Some(ref app_id) = group.firebase_app_id {
                    resolved.android.firebase.app_id = app_id.clone();
                }
                if let Some(ref track) = group.play_track {
                    resolved.android.play_console.track = track.clone();
                }
            }
            Platform::Ios => {
                if let Some(ref groups) = group.firebase_groups {
                    resolved.ios.firebase.groups = groups.clone();
                }
                if let Some(ref app_id) = group.firebase_app_id {
                    resolved.ios.firebase.app_id = app_id.clone();
                }
                if let Some(ref groups) = group.testflight_groups {
                    resolved.ios.testflight.groups = groups.clone();
                }
            }
        }

        Some(resolved)
    }
}

/// A named set of overrides for one build flavor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlavorGroup {
    /// Platform this flavor applies to
    pub platform: Platform,

    /// Build flavor passed to the builder
    #[serde(default)]
    pub build_flavor: Option<String>,

    /// Firebase app override
    #[serde(default)]
    pub firebase_app_id: Option<String>,

    /// Firebase tester groups override
    #[serde(default)]
    pub firebase_groups: Option<Vec<String>>,

    /// Play Console track override
    #[serde(default)]
    pub play_track: Option<String>,

    /// TestFlight groups override
    #[serde(default)]
    pub testflight_groups: Option<Vec<String>>,
}

/// Android destinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidDeployConfig {
    /// Firebase App Distribution
    pub firebase: FirebaseDestination,

    /// Google Play Console
    pub play_console: PlayConsoleDestination,
}

/// iOS destinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IosDeployConfig {
    /// TestFlight
    pub testflight: TestFlightDestination,

    /// App Store
    pub app_store: AppStoreDestination,

    /// Firebase App Distribution (ad-hoc IPA)
    pub firebase: FirebaseDestination,
}

/// Firebase App Distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseDestination {
    /// Whether this destination is enabled
    pub enabled: bool,

    /// Firebase app ID (`1:1234567890:android:abc123`)
    pub app_id: String,

    /// Google Cloud project number; derived from `app_id` when unset
    pub project_number: Option<String>,

    /// Service account JSON path; falls back to `service_account_env`
    pub service_account: Option<PathBuf>,

    /// Environment variable holding a service account path or JSON
    pub service_account_env: String,

    /// Tester group aliases
    pub groups: Vec<String>,

    /// Individual tester emails
    pub testers: Vec<String>,
}

impl Default for FirebaseDestination {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: String::new(),
            project_number: None,
            service_account: None,
            service_account_env: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            groups: Vec::new(),
            testers: Vec::new(),
        }
    }
}

impl FirebaseDestination {
    /// Project number from config, or the second segment of the app ID
    pub fn project_number(&self) -> Option<String> {
        self.project_number
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.app_id
                    .split(':')
                    .nth(1)
                    .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                    .map(str::to_string)
            })
    }
}

/// Google Play Console settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConsoleDestination {
    /// Whether this destination is enabled
    pub enabled: bool,

    /// Service account JSON path; falls back to `service_account_env`
    pub service_account: Option<PathBuf>,

    /// Environment variable holding a service account path or JSON
    pub service_account_env: String,

    /// Release track (internal, alpha, beta, production)
    pub track: String,

    /// Staged rollout fraction in (0, 1]
    pub rollout: f64,

    /// Release status (completed, draft, inProgress, halted)
    pub status: Option<String>,
}

impl Default for PlayConsoleDestination {
    fn default() -> Self {
        Self {
            enabled: false,
            service_account: None,
            service_account_env: "GOOGLE_PLAY_SERVICE_ACCOUNT".to_string(),
            track: "internal".to_string(),
            rollout: 1.0,
            status: None,
        }
    }
}

/// App Store Connect API credentials shared by TestFlight and App Store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStoreConnectAuth {
    /// API key ID; falls back to `APP_STORE_CONNECT_KEY_ID`
    pub api_key_id: Option<String>,

    /// Issuer ID; falls back to `APP_STORE_CONNECT_ISSUER_ID`
    pub issuer_id: Option<String>,

    /// Path to the `.p8` key; falls back to `APP_STORE_CONNECT_KEY_PATH`
    pub api_key_path: Option<PathBuf>,

    /// Numeric App Store Connect app ID
    pub app_id: Option<String>,
}

/// TestFlight settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestFlightDestination {
    /// Whether this destination is enabled
    pub enabled: bool,

    /// API credentials
    #[serde(flatten)]
    pub auth: AppStoreConnectAuth,

    /// Beta groups to add the build to
    pub groups: Vec<String>,

    /// Wait for App Store Connect processing before returning
    pub wait_for_processing: bool,
}

/// App Store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppStoreDestination {
    /// Whether this destination is enabled
    pub enabled: bool,

    /// API credentials
    #[serde(flatten)]
    pub auth: AppStoreConnectAuth,
}

/// Notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Whether notifications are sent
    pub enabled: bool,

    /// Environment variable holding the webhook URL
    pub webhook_url_env: String,

    /// Notify on successful deploys
    pub on_success: bool,

    /// Notify on failed deploys
    pub on_failure: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url_env: "LAUNCHPAD_WEBHOOK_URL".to_string(),
            on_success: true,
            on_failure: true,
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown summary
    #[default]
    Markdown,
    /// JSON document
    Json,
}

/// Deployment report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Whether reports are written
    pub enabled: bool,

    /// Output directory
    pub output: PathBuf,

    /// Report format
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output: PathBuf::from(".launchpad/reports"),
            format: ReportFormat::Markdown,
        }
    }
}
