//! Core types shared across the pipeline

use serde::{Deserialize, Serialize};

/// Target platform. The set is closed: every orchestrator dispatches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android (APK / AAB)
    Android,
    /// iOS (IPA)
    Ios,
}

impl Platform {
    /// Every supported platform, in pipeline order
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Android => "Android",
            Self::Ios => "iOS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" | "iphone" => Ok(Self::Ios),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Semantic version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Breaking changes (x.0.0)
    Major,
    /// New features (0.x.0)
    Minor,
    /// Bug fixes (0.0.x)
    Patch,
}

impl BumpLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BumpLevel {
    type Err = crate::error::VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            _ => Err(crate::error::VersionError::InvalidBumpLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!("iOS".parse::<Platform>().unwrap(), Platform::Ios);
        assert!("web".parse::<Platform>().is_err());
    }

    #[test]
    fn test_bump_level_parse() {
        assert_eq!("Minor".parse::<BumpLevel>().unwrap(), BumpLevel::Minor);
        assert!("huge".parse::<BumpLevel>().is_err());
    }

    #[test]
    fn test_platform_serde_lowercase() {
        let yaml = serde_yaml::to_string(&Platform::Ios).unwrap();
        assert_eq!(yaml.trim(), "ios");
    }
}
