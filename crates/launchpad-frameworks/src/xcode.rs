//! iOS builds through xcodebuild

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use plist::Value as PlistValue;
use tracing::{debug, info, instrument, warn};

use launchpad_core::config::IosBuildConfig;
use launchpad_core::{Config, Platform};

use crate::artifacts::{find_newest, ios_export_dir};
use crate::builder::{BuildOptions, PlatformBuilder};
use crate::error::{BuildError, Result};
use crate::output::BuildOutput;
use crate::process::run_tool;

/// Xcode container to build from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XcodeProject {
    Workspace(PathBuf),
    Project(PathBuf),
}

impl XcodeProject {
    fn args(&self) -> [String; 2] {
        match self {
            Self::Workspace(p) => ["-workspace".to_string(), p.display().to_string()],
            Self::Project(p) => ["-project".to_string(), p.display().to_string()],
        }
    }
}

/// Archives and exports IPAs with `xcodebuild`
#[derive(Debug, Clone, Default)]
pub struct XcodeBuilder;

impl XcodeBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the workspace or project to build. Configured names win, then a
    /// workspace found on disk, then a project.
    pub fn find_project(&self, ios: &IosBuildConfig, project_dir: &Path) -> Result<XcodeProject> {
        if let Some(ref ws) = ios.workspace {
            return Ok(XcodeProject::Workspace(project_dir.join(ws)));
        }
        if let Some(ref proj) = ios.project {
            return Ok(XcodeProject::Project(project_dir.join(proj)));
        }

        let mut workspace = None;
        let mut project = None;
        if let Ok(entries) = std::fs::read_dir(project_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.ends_with(".xcworkspace") && !name.starts_with("project.") {
                    workspace = Some(entry.path());
                } else if name.ends_with(".xcodeproj") {
                    project = Some(entry.path());
                }
            }
        }

        workspace
            .map(XcodeProject::Workspace)
            .or(project.map(XcodeProject::Project))
            .ok_or_else(|| BuildError::ProjectNotFound {
                platform: Platform::Ios,
                path: project_dir.to_path_buf(),
            })
    }

    /// Write an ExportOptions.plist for the configured export method
    pub fn write_export_options(&self, config: &Config, path: &Path) -> Result<()> {
        let ios = &config.build.ios;
        let mut options = plist::Dictionary::new();
        options.insert(
            "method".to_string(),
            PlistValue::String(ios.export_method.clone()),
        );
        if let Some(ref team_id) = ios.team_id {
            options.insert("teamID".to_string(), PlistValue::String(team_id.clone()));
        }
        options.insert(
            "signingStyle".to_string(),
            PlistValue::String("automatic".to_string()),
        );
        options.insert("compileBitcode".to_string(), PlistValue::Boolean(false));
        options.insert("uploadSymbols".to_string(), PlistValue::Boolean(true));

        plist::to_file_xml(path, &PlistValue::Dictionary(options))?;
        debug!(path = %path.display(), "export options written");
        Ok(())
    }

    fn archive_args(&self, ios: &IosBuildConfig, project: &XcodeProject, archive: &Path) -> Vec<String> {
        let mut args = vec!["archive".to_string()];
        args.extend(project.args());
        args.extend([
            "-scheme".to_string(),
            ios.scheme.clone(),
            "-configuration".to_string(),
            ios.configuration.clone(),
            "-archivePath".to_string(),
            archive.display().to_string(),
            "-destination".to_string(),
            "generic/platform=iOS".to_string(),
            "-allowProvisioningUpdates".to_string(),
        ]);
        if let Some(ref team_id) = ios.team_id {
            args.push(format!("DEVELOPMENT_TEAM={}", team_id));
        }
        args
    }
}

#[async_trait]
impl PlatformBuilder for XcodeBuilder {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    #[instrument(skip(self, config, options), fields(base_dir = %base_dir.display()))]
    async fn build(
        &self,
        base_dir: &Path,
        config: &Config,
        options: BuildOptions,
    ) -> Result<BuildOutput> {
        let ios = &config.build.ios;
        let project_dir = base_dir.join(&ios.project_dir);
        let project = self.find_project(ios, &project_dir)?;

        let xcodebuild = which::which("xcodebuild").map_err(|_| BuildError::ToolNotFound {
            tool: "xcodebuild".to_string(),
            install_hint: "Install Xcode from the App Store".to_string(),
        })?;

        let build_dir = base_dir.join("build/ios");
        let export_dir = base_dir.join(ios_export_dir());
        std::fs::create_dir_all(&export_dir)?;
        let archive = build_dir.join(format!("{}.xcarchive", ios.scheme));

        info!(scheme = %ios.scheme, configuration = %ios.configuration, "starting xcodebuild archive");
        let started = Instant::now();

        let args = self.archive_args(ios, &project, &archive);
        let output = run_tool(&xcodebuild, &args, &project_dir, &config.env).await?;
        if options.verbose {
            debug!(stdout = %output.stdout, "xcodebuild archive output");
        }
        let mut warnings = output.warnings();
        if !output.success {
            warn!(exit_code = ?output.exit_code, "xcodebuild archive failed");
            return Ok(BuildOutput::failed(
                Platform::Ios,
                format!("xcodebuild archive failed:\n{}", output.tail(20)),
            )
            .with_warnings(warnings)
            .with_duration(started.elapsed().as_millis() as u64));
        }

        let (export_options, generated) = match ios.export_options_plist {
            Some(ref custom) => (project_dir.join(custom), false),
            None => {
                let path = build_dir.join("ExportOptions.plist");
                self.write_export_options(config, &path)?;
                (path, true)
            }
        };

        let export_args = vec![
            "-exportArchive".to_string(),
            "-archivePath".to_string(),
            archive.display().to_string(),
            "-exportPath".to_string(),
            export_dir.display().to_string(),
            "-exportOptionsPlist".to_string(),
            export_options.display().to_string(),
            "-allowProvisioningUpdates".to_string(),
        ];
        let output = run_tool(&xcodebuild, &export_args, &project_dir, &config.env).await?;
        if generated {
            let _ = std::fs::remove_file(&export_options);
        }
        warnings.extend(output.warnings());
        let duration_ms = started.elapsed().as_millis() as u64;

        if !output.success {
            warn!(exit_code = ?output.exit_code, "xcodebuild export failed");
            return Ok(BuildOutput::failed(
                Platform::Ios,
                format!("xcodebuild export failed:\n{}", output.tail(20)),
            )
            .with_warnings(warnings)
            .with_duration(duration_ms));
        }

        match find_newest(&export_dir, "ipa") {
            Some(ipa) => {
                info!(artifact = %ipa.display(), duration_ms, "xcodebuild export finished");
                // Exported IPAs carry the distribution signature
                Ok(BuildOutput::succeeded(Platform::Ios, ipa)
                    .with_signed(true)
                    .with_warnings(warnings)
                    .with_duration(duration_ms))
            }
            None => Err(BuildError::ArtifactNotFound {
                expected_path: export_dir,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_prefers_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Runner.xcodeproj")).unwrap();
        std::fs::create_dir_all(temp.path().join("Runner.xcworkspace")).unwrap();

        let project = XcodeBuilder::new()
            .find_project(&IosBuildConfig::default(), temp.path())
            .unwrap();
        assert_eq!(
            project,
            XcodeProject::Workspace(temp.path().join("Runner.xcworkspace"))
        );
    }

    #[test]
    fn test_configured_project_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Runner.xcworkspace")).unwrap();
        let ios = IosBuildConfig {
            project: Some("App.xcodeproj".to_string()),
            ..Default::default()
        };

        let project = XcodeBuilder::new().find_project(&ios, temp.path()).unwrap();
        assert_eq!(project, XcodeProject::Project(temp.path().join("App.xcodeproj")));
    }

    #[test]
    fn test_no_project() {
        let temp = TempDir::new().unwrap();
        let err = XcodeBuilder::new()
            .find_project(&IosBuildConfig::default(), temp.path())
            .unwrap_err();
        assert!(matches!(err, BuildError::ProjectNotFound { .. }));
    }

    #[test]
    fn test_export_options() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ExportOptions.plist");
        let mut config = Config::default();
        config.build.ios.export_method = "ad-hoc".to_string();
        config.build.ios.team_id = Some("ABCDE12345".to_string());

        XcodeBuilder::new().write_export_options(&config, &path).unwrap();

        let value = PlistValue::from_file(&path).unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.get("method").and_then(|v| v.as_string()), Some("ad-hoc"));
        assert_eq!(
            dict.get("teamID").and_then(|v| v.as_string()),
            Some("ABCDE12345")
        );
    }

    #[test]
    fn test_archive_args() {
        let ios = IosBuildConfig {
            team_id: Some("TEAM".to_string()),
            ..Default::default()
        };
        let args = XcodeBuilder::new().archive_args(
            &ios,
            &XcodeProject::Workspace(PathBuf::from("Runner.xcworkspace")),
            Path::new("build/ios/Runner.xcarchive"),
        );
        assert_eq!(args[0], "archive");
        assert_eq!(args[1], "-workspace");
        assert!(args.contains(&"Runner".to_string()));
        assert_eq!(args.last().unwrap(), "DEVELOPMENT_TEAM=TEAM");
    }
}
