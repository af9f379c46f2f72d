//! Tool-backed artifact signers

mod aab;
mod apk;

pub use aab::AabSigner;
pub use apk::ApkSigner;

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::config::SigningConfig;
use crate::error::{Result, SigningError};

/// Environment variable carrying the keystore password to the child process
pub(crate) const STORE_PASS_ENV: &str = "LAUNCHPAD_SIGNING_STORE_PASS";

/// Environment variable carrying the key password to the child process
pub(crate) const KEY_PASS_ENV: &str = "LAUNCHPAD_SIGNING_KEY_PASS";

/// Run a signing tool. Passwords travel through the child's environment so
/// they never appear on its command line.
pub(crate) async fn run_signing_tool(
    tool: &Path,
    args: &[String],
    signing: &SigningConfig,
) -> Result<String> {
    let name = tool
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.display().to_string());
    debug!(tool = %name, ?args, "running signing tool");

    let output = Command::new(tool)
        .args(args)
        .env(STORE_PASS_ENV, &signing.store_password)
        .env(KEY_PASS_ENV, &signing.key_password)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(SigningError::ToolFailed { tool: name, reason });
    }

    Ok(stdout)
}
