//! Deployment reports

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use launchpad_core::config::ReportFormat;
use launchpad_core::{Config, Platform};
use launchpad_stores::DeploymentResults;

/// One platform's deploy, as written to disk
#[derive(Debug, Serialize)]
pub struct DeploymentReport<'a> {
    pub app: &'a str,
    pub version: &'a str,
    pub platform: Platform,
    pub generated_at: DateTime<Utc>,
    pub artifact: Option<&'a Path>,
    pub success: bool,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: &'a DeploymentResults,
}

impl<'a> DeploymentReport<'a> {
    pub fn new(
        config: &'a Config,
        version: &'a str,
        artifact: Option<&'a Path>,
        results: &'a DeploymentResults,
    ) -> Self {
        Self {
            app: &config.app.name,
            version,
            platform: results.platform,
            generated_at: Utc::now(),
            artifact,
            success: results.success(),
            success_count: results.success_count(),
            failure_count: results.failure_count(),
            results,
        }
    }

    /// Markdown rendering
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {} {} - {} deployment\n\n",
            self.app,
            self.version,
            self.platform.display_name()
        );
        out.push_str(&format!(
            "- Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(artifact) = self.artifact {
            out.push_str(&format!("- Artifact: `{}`\n", artifact.display()));
        }
        out.push_str(&format!(
            "- Status: {} ({} succeeded, {} failed)\n\n",
            if self.success { "success" } else { "failed" },
            self.success_count,
            self.failure_count
        ));

        out.push_str("| Destination | Status | Build | Details |\n");
        out.push_str("|---|---|---|---|\n");
        for result in &self.results.individual {
            let details = result
                .error
                .clone()
                .or_else(|| result.build_url.clone())
                .unwrap_or_else(|| result.message.clone());
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                result.destination.display_name(),
                if result.success { "✅" } else { "❌" },
                result.build_id.as_deref().unwrap_or("-"),
                details.replace('|', "\\|")
            ));
        }
        out
    }

    /// Write the report to `<output>/<platform>-<timestamp>.<ext>`
    pub fn write(&self, base_dir: &Path, config: &Config) -> anyhow::Result<PathBuf> {
        let dir = base_dir.join(&config.report.output);
        std::fs::create_dir_all(&dir)?;

        let (ext, content) = match config.report.format {
            ReportFormat::Markdown => ("md", self.to_markdown()),
            ReportFormat::Json => ("json", serde_json::to_string_pretty(self)?),
        };
        let path = dir.join(format!(
            "{}-{}.{}",
            self.platform,
            self.generated_at.format("%Y%m%d-%H%M%S"),
            ext
        ));
        debug!(path = %path.display(), "writing deployment report");
        std::fs::write(&path, content)?;
        info!(path = %path.display(), platform = %self.platform, "deployment report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_stores::{DeployResult, Destination};
    use tempfile::TempDir;

    fn results() -> DeploymentResults {
        let mut results = DeploymentResults::new(Platform::Android);
        results.push(
            DeployResult::succeeded(Destination::Firebase, "Distributed")
                .with_build_id(Some("r7".to_string()))
                .with_build_url(Some("https://console.firebase.google.com/r7".to_string())),
        );
        results.push(DeployResult::failed(Destination::PlayConsole, "403 | forbidden"));
        results
    }

    #[test]
    fn test_markdown() {
        let mut config = Config::default();
        config.app.name = "Rocket".to_string();
        let results = results();
        let report = DeploymentReport::new(&config, "1.2.0", None, &results);

        let md = report.to_markdown();
        assert!(md.starts_with("# Rocket 1.2.0 - Android deployment"));
        assert!(md.contains("failed (1 succeeded, 1 failed)"));
        assert!(md.contains("| Firebase App Distribution | ✅ | r7 | https://console.firebase.google.com/r7 |"));
        assert!(md.contains("403 \\| forbidden"));
    }

    #[test]
    fn test_write_json() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.report.format = ReportFormat::Json;
        let results = results();
        let artifact = temp.path().join("app.aab");
        let report = DeploymentReport::new(&config, "1.2.0", Some(&artifact), &results);

        let path = report.write(temp.path(), &config).unwrap();
        assert!(path.starts_with(temp.path().join(".launchpad/reports")));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("android-"));
        assert_eq!(path.extension().unwrap(), "json");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], "1.2.0");
        assert_eq!(json["failure_count"], 1);
        assert_eq!(json["results"]["individual"][0]["destination"], "firebase");
    }
}
