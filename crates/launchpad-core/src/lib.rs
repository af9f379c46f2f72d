//! Launchpad Core - configuration and versioning for mobile release automation
//!
//! This crate provides the configuration model and its validation, the shared
//! platform types, error handling, and the version bump pipeline used by the
//! Launchpad CLI.

pub mod config;
pub mod error;
pub mod types;
pub mod version;

pub use config::{Config, ConfigViolation};
pub use error::{ChangelogError, ConfigError, LaunchpadError, Result, VersionError};
pub use types::{BumpLevel, Platform};
pub use version::{SemanticVersion, VersionBumpResult, VersionOrchestrator};
