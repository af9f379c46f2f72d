//! Destinations and deployment results

use std::fmt;

use serde::Serialize;

use launchpad_core::config::DeployConfig;
use launchpad_core::Platform;

/// A distribution destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Firebase App Distribution
    Firebase,
    /// Google Play Console
    PlayConsole,
    /// TestFlight beta distribution
    TestFlight,
    /// App Store release
    AppStore,
}

impl Destination {
    pub const ALL: [Destination; 4] = [
        Destination::Firebase,
        Destination::PlayConsole,
        Destination::TestFlight,
        Destination::AppStore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::PlayConsole => "play_console",
            Self::TestFlight => "testflight",
            Self::AppStore => "app_store",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Firebase => "Firebase App Distribution",
            Self::PlayConsole => "Play Console",
            Self::TestFlight => "TestFlight",
            Self::AppStore => "App Store",
        }
    }

    /// Whether the destination accepts artifacts for the platform
    pub fn supports(&self, platform: Platform) -> bool {
        match self {
            Self::Firebase => true,
            Self::PlayConsole => platform == Platform::Android,
            Self::TestFlight | Self::AppStore => platform == Platform::Ios,
        }
    }

    /// Destinations enabled for a platform, in a stable order
    pub fn enabled_for(platform: Platform, deploy: &DeployConfig) -> Vec<Destination> {
        Self::ALL
            .into_iter()
            .filter(|d| d.supports(platform))
            .filter(|d| match (platform, d) {
                (Platform::Android, Self::Firebase) => deploy.android.firebase.enabled,
                (Platform::Android, Self::PlayConsole) => deploy.android.play_console.enabled,
                (Platform::Ios, Self::Firebase) => deploy.ios.firebase.enabled,
                (Platform::Ios, Self::TestFlight) => deploy.ios.testflight.enabled,
                (Platform::Ios, Self::AppStore) => deploy.ios.app_store.enabled,
                _ => false,
            })
            .collect()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Outcome of one platform/destination pair
#[derive(Debug, Clone, Serialize)]
pub struct DeployResult {
    pub success: bool,
    pub destination: Destination,
    pub message: String,
    pub error: Option<String>,
    /// Browsable URL for the uploaded build
    pub build_url: Option<String>,
    /// Destination-specific build or release identifier
    pub build_id: Option<String>,
    pub duration_ms: u64,
}

impl DeployResult {
    pub fn succeeded(destination: Destination, message: impl Into<String>) -> Self {
        Self {
            success: true,
            destination,
            message: message.into(),
            error: None,
            build_url: None,
            build_id: None,
            duration_ms: 0,
        }
    }

    pub fn failed(destination: Destination, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            destination,
            message: format!("{} upload failed", destination.display_name()),
            error: Some(error),
            build_url: None,
            build_id: None,
            duration_ms: 0,
        }
    }

    pub fn with_build_url(mut self, url: Option<String>) -> Self {
        self.build_url = url;
        self
    }

    pub fn with_build_id(mut self, id: Option<String>) -> Self {
        self.build_id = id;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Every destination outcome for one platform.
///
/// Aggregates are computed from `individual` on each call.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentResults {
    pub platform: Platform,
    pub individual: Vec<DeployResult>,
}

impl DeploymentResults {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            individual: Vec::new(),
        }
    }

    pub fn push(&mut self, result: DeployResult) {
        self.individual.push(result);
    }

    pub fn success_count(&self) -> usize {
        self.individual.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.individual.iter().filter(|r| !r.success).count()
    }

    /// True when no destination failed
    pub fn success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn is_empty(&self) -> bool {
        self.individual.is_empty()
    }

    /// Result for one destination, if it was attempted
    pub fn get(&self, destination: Destination) -> Option<&DeployResult> {
        self.individual.iter().find(|r| r.destination == destination)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeployResult> {
        self.individual.iter().filter(|r| !r.success)
    }

    /// One-line summary
    pub fn message(&self) -> String {
        if self.individual.is_empty() {
            return format!("No {} destinations enabled", self.platform.display_name());
        }
        if self.success() {
            return format!(
                "Deployed {} to {} destination(s)",
                self.platform.display_name(),
                self.success_count()
            );
        }
        let failed: Vec<&str> = self.failures().map(|r| r.destination.display_name()).collect();
        format!(
            "{} of {} {} destination(s) failed: {}",
            self.failure_count(),
            self.individual.len(),
            self.platform.display_name(),
            failed.join(", ")
        )
    }
}
