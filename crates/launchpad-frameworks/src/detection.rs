//! Project detection
//!
//! Inspects a working directory and decides which platforms can be built from it.
//! Android projects are recognised by their Gradle files, iOS projects by an Xcode
//! workspace or project. Each platform is looked up in its configured project
//! directory first and then in the base directory itself.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use launchpad_core::config::validate;
use launchpad_core::{Config, ConfigViolation, Platform};

/// Detection result for one platform
#[derive(Debug, Clone, Copy)]
pub enum Detection {
    /// Platform definitely not present
    No,
    /// Platform might be present with confidence 0-100
    Maybe(u8),
    /// Platform definitely present with confidence 0-100
    Yes(u8),
}

impl Detection {
    /// Get the confidence score (0-100)
    pub fn confidence(&self) -> u8 {
        match self {
            Self::No => 0,
            Self::Maybe(c) | Self::Yes(c) => *c,
        }
    }

    /// Check if detected (Maybe or Yes)
    pub fn detected(&self) -> bool {
        !matches!(self, Self::No)
    }

    /// Check if confident (Yes with high confidence)
    pub fn is_confident(&self) -> bool {
        matches!(self, Self::Yes(c) if *c >= 80)
    }
}

impl PartialEq for Detection {
    fn eq(&self, other: &Self) -> bool {
        self.confidence() == other.confidence()
    }
}

impl Eq for Detection {}

impl PartialOrd for Detection {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Detection {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.confidence().cmp(&other.confidence())
    }
}

/// Detection outcome for one platform
#[derive(Debug, Clone)]
pub struct ProjectDetection {
    pub platform: Platform,
    pub detection: Detection,
    /// Directory the platform project was found in
    pub root: Option<PathBuf>,
}

/// Detects buildable platforms in a directory
#[derive(Debug, Clone, Default)]
pub struct ProjectDetector;

impl ProjectDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect every platform, strongest first
    #[instrument(skip(self, config), fields(base_dir = %base_dir.display()))]
    pub fn detect(&self, config: &Config, base_dir: &Path) -> Vec<ProjectDetection> {
        let mut results: Vec<_> = Platform::ALL
            .into_iter()
            .map(|platform| self.detect_platform(config, base_dir, platform))
            .filter(|r| r.detection.detected())
            .collect();

        results.sort_by(|a, b| b.detection.cmp(&a.detection));
        debug!(count = results.len(), "platform detection finished");
        results
    }

    /// Detect a single platform
    pub fn detect_platform(
        &self,
        config: &Config,
        base_dir: &Path,
        platform: Platform,
    ) -> ProjectDetection {
        let project_dir = match platform {
            Platform::Android => &config.build.android.project_dir,
            Platform::Ios => &config.build.ios.project_dir,
        };

        let mut candidates = vec![base_dir.join(project_dir)];
        if !project_dir.as_os_str().is_empty() && project_dir != Path::new(".") {
            candidates.push(base_dir.to_path_buf());
        }

        let best = candidates
            .into_iter()
            .map(|dir| {
                let detection = match platform {
                    Platform::Android => detect_android(&dir),
                    Platform::Ios => detect_ios(&dir),
                };
                (detection, dir)
            })
            .max_by(|a, b| a.0.cmp(&b.0));

        match best {
            Some((detection, dir)) if detection.detected() => {
                debug!(platform = %platform, confidence = detection.confidence(), dir = %dir.display(), "platform detected");
                ProjectDetection {
                    platform,
                    detection,
                    root: Some(dir),
                }
            }
            _ => ProjectDetection {
                platform,
                detection: Detection::No,
                root: None,
            },
        }
    }

    /// Whether the platform's project can be found
    pub fn is_detected(&self, config: &Config, base_dir: &Path, platform: Platform) -> bool {
        self.detect_platform(config, base_dir, platform)
            .detection
            .detected()
    }

    /// Platforms that are both enabled in the build config and present on disk
    pub fn resolve_platforms(&self, config: &Config, base_dir: &Path) -> Vec<Platform> {
        config
            .enabled_platforms()
            .into_iter()
            .filter(|p| self.is_detected(config, base_dir, *p))
            .collect()
    }
}

fn detect_android(dir: &Path) -> Detection {
    if !dir.is_dir() {
        return Detection::No;
    }

    if file_exists(dir, "settings.gradle") || file_exists(dir, "settings.gradle.kts") {
        return Detection::Yes(90);
    }

    if file_exists(dir, "build.gradle") || file_exists(dir, "build.gradle.kts") {
        return Detection::Yes(80);
    }

    if file_exists(dir, "gradlew") {
        return Detection::Maybe(60);
    }

    Detection::No
}

fn detect_ios(dir: &Path) -> Detection {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Detection::No;
    };

    let mut best = Detection::No;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();

        let found = if name.ends_with(".xcworkspace") && !name.starts_with("project.") {
            Detection::Yes(95)
        } else if name.ends_with(".xcodeproj") {
            Detection::Yes(90)
        } else if name == "Podfile" {
            Detection::Maybe(50)
        } else {
            Detection::No
        };

        if found > best {
            best = found;
        }
    }
    best
}

/// Check if a file exists in a directory
pub fn file_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).exists()
}

/// Validate a config and additionally report enabled platforms missing from `base_dir`
pub fn validate_for_project(config: &Config, base_dir: &Path) -> Vec<ConfigViolation> {
    let mut violations = validate(config);
    let detector = ProjectDetector::new();

    for platform in config.enabled_platforms() {
        if !detector.is_detected(config, base_dir, platform) {
            violations.push(ConfigViolation::new(
                format!("build.{}.enabled", platform),
                format!(
                    "{} is enabled but no {} project was found in {}",
                    platform.display_name(),
                    platform.display_name(),
                    base_dir.display()
                ),
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(android: bool, ios: bool) -> Config {
        let mut config = Config::default();
        config.app.name = "Demo".to_string();
        config.app.package_id = Some("com.example.demo".to_string());
        config.app.bundle_id = Some("com.example.demo".to_string());
        config.build.android.enabled = android;
        config.build.ios.enabled = ios;
        config
    }

    #[test]
    fn test_detection_ordering() {
        assert!(Detection::Yes(90) > Detection::Maybe(60));
        assert!(Detection::Maybe(10) > Detection::No);
        assert!(!Detection::No.detected());
        assert!(Detection::Yes(80).is_confident());
        assert!(!Detection::Maybe(80).is_confident());
    }

    #[test]
    fn test_detect_android_in_project_dir() {
        let temp = TempDir::new().unwrap();
        let android = temp.path().join("android");
        std::fs::create_dir_all(&android).unwrap();
        std::fs::write(android.join("settings.gradle.kts"), "").unwrap();

        let detection =
            ProjectDetector::new().detect_platform(&config(true, false), temp.path(), Platform::Android);
        assert_eq!(detection.detection.confidence(), 90);
        assert_eq!(detection.root, Some(android));
    }

    #[test]
    fn test_detect_android_in_base_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("build.gradle"), "").unwrap();

        let detection =
            ProjectDetector::new().detect_platform(&config(true, false), temp.path(), Platform::Android);
        assert!(detection.detection.is_confident());
        assert_eq!(detection.root.as_deref(), Some(temp.path()));
    }

    #[test]
    fn test_detect_ios_workspace_beats_project() {
        let temp = TempDir::new().unwrap();
        let ios = temp.path().join("ios");
        std::fs::create_dir_all(ios.join("Runner.xcodeproj")).unwrap();
        std::fs::create_dir_all(ios.join("Runner.xcworkspace")).unwrap();

        let detection =
            ProjectDetector::new().detect_platform(&config(false, true), temp.path(), Platform::Ios);
        assert_eq!(detection.detection.confidence(), 95);
    }

    #[test]
    fn test_nothing_detected() {
        let temp = TempDir::new().unwrap();
        let detector = ProjectDetector::new();
        assert!(detector.detect(&config(true, true), temp.path()).is_empty());
    }

    #[test]
    fn test_resolve_requires_enabled_and_detected() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("android")).unwrap();
        std::fs::write(temp.path().join("android/settings.gradle"), "").unwrap();
        std::fs::create_dir_all(temp.path().join("ios/App.xcodeproj")).unwrap();

        let detector = ProjectDetector::new();
        assert_eq!(
            detector.resolve_platforms(&config(true, false), temp.path()),
            vec![Platform::Android]
        );
        assert_eq!(
            detector.resolve_platforms(&config(true, true), temp.path()),
            vec![Platform::Android, Platform::Ios]
        );
        assert!(detector
            .resolve_platforms(&config(false, false), temp.path())
            .is_empty());
    }

    #[test]
    fn test_validate_for_project_reports_undetected() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("android")).unwrap();
        std::fs::write(temp.path().join("android/settings.gradle"), "").unwrap();

        assert!(validate_for_project(&config(true, false), temp.path()).is_empty());

        let violations = validate_for_project(&config(true, true), temp.path());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "build.ios.enabled");
    }
}
