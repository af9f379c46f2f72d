//! Lenient semantic version

use serde::{Deserialize, Serialize};

use crate::types::BumpLevel;

/// A `major.minor.patch` triple.
///
/// Ordering is the tuple ordering of the three components. Parsing never fails:
/// missing or unparsable components become 0.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SemanticVersion {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a version from its components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse leniently. A leading `v`, pre-release and build suffixes are ignored.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.').map(|p| p.trim().parse::<u64>().unwrap_or(0));

        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
        }
    }

    /// Bump by level name. Unknown levels return the version unchanged.
    pub fn bump(&self, level: &str) -> Self {
        match level.parse::<BumpLevel>() {
            Ok(level) => self.bump_level(level),
            Err(_) => *self,
        }
    }

    /// Bump by a typed level
    pub fn bump_level(&self, level: BumpLevel) -> Self {
        match level {
            BumpLevel::Major => Self::new(self.major.saturating_add(1), 0, 0),
            BumpLevel::Minor => Self::new(self.major, self.minor.saturating_add(1), 0),
            BumpLevel::Patch => Self::new(self.major, self.minor, self.patch.saturating_add(1)),
        }
    }
}

impl std::fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<&str> for SemanticVersion {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_levels() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(v.bump("patch"), SemanticVersion::new(1, 2, 4));
        assert_eq!(v.bump("minor"), SemanticVersion::new(1, 3, 0));
        assert_eq!(v.bump("major"), SemanticVersion::new(2, 0, 0));
        assert_eq!(v.bump("unknown"), v);
        assert_eq!(v.bump("MINOR"), SemanticVersion::new(1, 3, 0));
    }

    #[test]
    fn test_parse_missing_components() {
        assert_eq!(SemanticVersion::parse("1.2"), SemanticVersion::new(1, 2, 0));
        assert_eq!(SemanticVersion::parse("7"), SemanticVersion::new(7, 0, 0));
        assert_eq!(SemanticVersion::parse(""), SemanticVersion::new(0, 0, 0));
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(SemanticVersion::parse("v2.x.5"), SemanticVersion::new(2, 0, 5));
        assert_eq!(
            SemanticVersion::parse("1.4.0-beta.2+77"),
            SemanticVersion::new(1, 4, 0)
        );
        assert_eq!(SemanticVersion::parse("garbage"), SemanticVersion::default());
        assert_eq!(SemanticVersion::parse("1.2.3.4"), SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_bump_saturates_at_max() {
        let max = u64::MAX.to_string();
        let v = SemanticVersion::parse(&format!("{0}.{0}.{0}", max));
        assert_eq!(v.bump_level(BumpLevel::Patch), v);
        assert_eq!(v.bump_level(BumpLevel::Minor), SemanticVersion::new(u64::MAX, u64::MAX, 0));
        assert_eq!(v.bump_level(BumpLevel::Major), SemanticVersion::new(u64::MAX, 0, 0));
    }

    #[test]
    fn test_ordering_and_display() {
        let a = SemanticVersion::parse("1.10.0");
        let b = SemanticVersion::parse("1.9.9");
        assert!(a > b);
        assert!(SemanticVersion::new(2, 0, 0) > SemanticVersion::new(1, 99, 99));
        assert_eq!(a.to_string(), "1.10.0");
    }
}
