//! Platform builder contract

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use launchpad_core::{Config, Platform};

use crate::error::Result;
use crate::gradle::GradleBuilder;
use crate::output::BuildOutput;
use crate::xcode::XcodeBuilder;

/// Options shared by every build in one run
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Stream toolchain output at debug level
    pub verbose: bool,
    /// Report synthetic outputs without invoking any builder
    pub dry_run: bool,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Builds one platform's artifact.
///
/// Implementations wrap an external toolchain. A toolchain that runs but fails
/// should be reported as a failed [`BuildOutput`]; `Err` is for failures to run
/// the toolchain at all.
#[async_trait]
pub trait PlatformBuilder: Send + Sync {
    /// Platform this builder produces artifacts for
    fn platform(&self) -> Platform;

    /// Build the platform's artifact from `base_dir`
    async fn build(&self, base_dir: &Path, config: &Config, options: BuildOptions)
        -> Result<BuildOutput>;
}

/// Builders for every platform backed by the native toolchains
pub fn default_builders() -> HashMap<Platform, Arc<dyn PlatformBuilder>> {
    let mut builders: HashMap<Platform, Arc<dyn PlatformBuilder>> = HashMap::new();
    builders.insert(Platform::Android, Arc::new(GradleBuilder::new()));
    builders.insert(Platform::Ios, Arc::new(XcodeBuilder::new()));
    builders
}
