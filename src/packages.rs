//! Nim package cache discovery and `nimble` plumbing.
//!
//! Out-of-scope-but-required plumbing (the tool surface names it even
//! though indexing packages is not this crate's core concern): agents
//! frequently need to know which packages are available in the local
//! Nimble cache before they can index a dependency.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::process::Command;

/// Well-known Nimble package cache locations, checked in order.
fn candidate_cache_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".nimble/pkgs2"));
        dirs.push(home.join(".nimble/pkgs"));
    }
    dirs.push(PathBuf::from("/usr/lib/nim/pkgs2"));
    dirs.push(PathBuf::from("/usr/local/lib/nim/pkgs2"));
    dirs
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub path: String,
}

/// The segment before the first `-` forms a package's base name (e.g. the
/// Nimble cache directory `jester-0.6.0-abcdef` registers as `jester`).
fn base_name(dir_name: &str) -> &str {
    dir_name.split('-').next().unwrap_or(dir_name)
}

/// Lists every package directory found across the known cache locations,
/// one entry per base name. Cache locations are walked in priority order and
/// the first directory seen for a given base name wins; later duplicates
/// (an older pinned version still on disk, or the same package present in
/// two cache roots) are skipped rather than overwriting it.
pub fn discover_packages() -> Vec<PackageInfo> {
    let mut seen = std::collections::HashSet::new();
    let mut packages = Vec::new();
    for dir in candidate_cache_dirs() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.filter_map(|e| e.ok()) {
            if entry.path().is_dir() {
                if let Some(dir_name) = entry.file_name().to_str() {
                    let name = base_name(dir_name).to_string();
                    if seen.insert(name.clone()) {
                        packages.push(PackageInfo {
                            name,
                            path: entry.path().to_string_lossy().into_owned(),
                        });
                    }
                }
            }
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_version_and_hash_suffix() {
        assert_eq!(base_name("jester-0.6.0-abcdef12"), "jester");
        assert_eq!(base_name("nim"), "nim");
    }
}

/// Runs `nimble <args>` in `project_root` and returns captured stdout.
pub async fn run_nimble(project_root: &std::path::Path, args: &[&str]) -> Result<String> {
    let output = Command::new("nimble")
        .args(args)
        .current_dir(project_root)
        .output()
        .await
        .context("failed to spawn nimble")?;

    if !output.status.success() {
        anyhow::bail!("nimble {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
