//! Artifact locations and fingerprints

use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use launchpad_core::config::{AndroidArtifact, AndroidBuildConfig};
use launchpad_core::{Config, Platform};

use crate::error::Result;

/// Conventional artifact path for a platform, as produced by its toolchain.
///
/// Dry runs report this path without building anything.
pub fn expected_artifact_path(config: &Config, base_dir: &Path, platform: Platform) -> PathBuf {
    match platform {
        Platform::Android => {
            let android = &config.build.android;
            base_dir
                .join(&android.project_dir)
                .join(android_output_dir(android))
                .join(android_file_name(android))
        }
        Platform::Ios => base_dir
            .join(ios_export_dir())
            .join(format!("{}.ipa", config.build.ios.scheme)),
    }
}

/// Gradle output directory for the configured variant, relative to the Android project
pub fn android_output_dir(android: &AndroidBuildConfig) -> PathBuf {
    let outputs = PathBuf::from("app/build/outputs");
    match android.artifact {
        AndroidArtifact::Aab => outputs.join("bundle").join(android.variant_name()),
        AndroidArtifact::Apk => {
            let dir = outputs.join("apk");
            match android.flavor.as_deref().filter(|f| !f.is_empty()) {
                Some(flavor) => dir.join(flavor).join(&android.build_type),
                None => dir.join(&android.build_type),
            }
        }
    }
}

fn android_file_name(android: &AndroidBuildConfig) -> String {
    let ext = android.artifact.extension();
    match android.flavor.as_deref().filter(|f| !f.is_empty()) {
        Some(flavor) => format!("app-{}-{}.{}", flavor, android.build_type, ext),
        None => format!("app-{}.{}", android.build_type, ext),
    }
}

/// Export directory for IPAs, relative to the base directory
pub fn ios_export_dir() -> PathBuf {
    PathBuf::from("build/ios/ipa")
}

/// Newest file with the given extension below `dir`, skipping test artifacts
pub fn find_newest(dir: &Path, ext: &str) -> Option<PathBuf> {
    let mut found = Vec::new();
    walk(dir, ext, &mut found, 0);

    found
        .into_iter()
        .filter(|p| {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            !name.contains("androidTest") && !name.contains("-test-")
        })
        .max_by_key(|p| p.metadata().and_then(|m| m.modified()).ok())
}

fn walk(dir: &Path, ext: &str, results: &mut Vec<PathBuf>, depth: usize) {
    if depth > 4 {
        return;
    }
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, ext, results, depth + 1);
            } else if path.extension().is_some_and(|e| e == ext) {
                results.push(path);
            }
        }
    }
}

/// SHA-256 of a file as lowercase hex
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// File size in bytes, or 0 when unreadable
pub fn file_size(path: &Path) -> u64 {
    path.metadata().map(|m| m.len()).unwrap_or(0)
}
