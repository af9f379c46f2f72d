//! Launchpad Frameworks - project detection and platform builds
//!
//! The [`BuildOrchestrator`] fans out over target platforms and collects one
//! [`BuildOutput`] per platform into a [`BuildResult`]. Each platform is built
//! by a [`PlatformBuilder`]; [`GradleBuilder`] and [`XcodeBuilder`] wrap the
//! native toolchains.

pub mod artifacts;
pub mod builder;
pub mod detection;
pub mod error;
pub mod gradle;
pub mod orchestrator;
pub mod output;
mod process;
pub mod xcode;

pub use builder::{default_builders, BuildOptions, PlatformBuilder};
pub use detection::{validate_for_project, Detection, ProjectDetection, ProjectDetector};
pub use error::{BuildError, Result};
pub use gradle::GradleBuilder;
pub use orchestrator::BuildOrchestrator;
pub use output::{BuildOutput, BuildResult};
pub use xcode::XcodeBuilder;
