//! Exit codes for the CLI

use launchpad_core::{ConfigError, LaunchpadError, VersionError};

/// Success
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// At least one platform failed to build
pub const BUILD_FAILURE: i32 = 6;

/// An artifact could not be signed
pub const SIGNING_FAILURE: i32 = 7;

/// At least one destination rejected the upload
pub const DEPLOY_FAILURE: i32 = 8;

/// A command that ran to completion but whose outcome was a failure
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CommandFailure {
    pub code: i32,
    pub message: String,
}

impl CommandFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Map an error reaching `main` to its process exit code
pub fn code_for(err: &anyhow::Error) -> i32 {
    if let Some(failure) = err.downcast_ref::<CommandFailure>() {
        return failure.code;
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }
    if err.downcast_ref::<VersionError>().is_some() {
        return VERSION_ERROR;
    }
    match err.downcast_ref::<LaunchpadError>() {
        Some(LaunchpadError::Config(_)) => CONFIG_ERROR,
        Some(LaunchpadError::Version(_)) => VERSION_ERROR,
        _ => ERROR,
    }
}
