//! Locating Android SDK and JDK signing tools

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SigningError};

/// Find a tool from the newest Android SDK build-tools, then on `PATH`
pub fn find_build_tool(name: &str, sdk_root: Option<&Path>) -> Result<PathBuf> {
    let mut roots: Vec<PathBuf> = sdk_root.map(Path::to_path_buf).into_iter().collect();
    roots.extend(
        ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(PathBuf::from),
    );
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Android/Sdk"));
        roots.push(home.join("Library/Android/sdk"));
    }

    for root in &roots {
        if let Some(tool) = newest_build_tool(root, name) {
            debug!(tool = %tool.display(), "found build tool in SDK");
            return Ok(tool);
        }
    }

    which::which(name).map_err(|_| SigningError::ToolNotFound {
        tool: name.to_string(),
        hint: "Install Android SDK build-tools or set ANDROID_HOME".to_string(),
    })
}

/// Find a JDK tool in `java_home/bin`, then on `PATH`
pub fn find_jdk_tool(name: &str, java_home: Option<&Path>) -> Result<PathBuf> {
    let homes = java_home
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::env::var("JAVA_HOME").ok().map(PathBuf::from));

    for home in homes {
        let tool = home.join("bin").join(executable(name));
        if tool.is_file() {
            return Ok(tool);
        }
    }

    which::which(name).map_err(|_| SigningError::ToolNotFound {
        tool: name.to_string(),
        hint: "Install a JDK or set JAVA_HOME".to_string(),
    })
}

fn newest_build_tool(sdk_root: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sdk_root.join("build-tools")).ok()?;
    let mut versions: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    versions.sort_by_key(|p| version_key(p));
    versions
        .into_iter()
        .rev()
        .map(|dir| dir.join(executable(name)))
        .find(|tool| tool.is_file())
}

fn version_key(dir: &Path) -> Vec<u32> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse().ok())
        .collect()
}

fn executable(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.bat", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_newest_build_tools_wins() {
        let temp = TempDir::new().unwrap();
        for version in ["9.0.0", "30.0.3", "34.0.0"] {
            let dir = temp.path().join("build-tools").join(version);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(executable("apksigner")), "").unwrap();
        }

        let tool = find_build_tool("apksigner", Some(temp.path())).unwrap();
        assert_eq!(
            tool,
            temp.path()
                .join("build-tools/34.0.0")
                .join(executable("apksigner"))
        );
    }

    #[test]
    fn test_skips_versions_without_tool() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build-tools/35.0.0-rc1")).unwrap();
        let old = temp.path().join("build-tools/33.0.1");
        std::fs::create_dir_all(&old).unwrap();
        std::fs::write(old.join(executable("apksigner")), "").unwrap();

        assert_eq!(
            newest_build_tool(temp.path(), "apksigner"),
            Some(old.join(executable("apksigner")))
        );
    }

    #[test]
    fn test_jdk_tool_from_java_home() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join(executable("jarsigner")), "").unwrap();

        let tool = find_jdk_tool("jarsigner", Some(temp.path())).unwrap();
        assert_eq!(tool, bin.join(executable("jarsigner")));
    }
}
