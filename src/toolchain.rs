//! Nim toolchain driver.
//!
//! Everything this module knows about Nim comes from spawning the `nim`
//! binary and reading its stdout/stderr/exit status — there is no
//! in-process use of the compiler's internal APIs. Each method shells out,
//! checks `status.success()`, and bails with the captured stderr on
//! failure, the same shape as a VCS wrapper driving `git`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ToolchainConfig;

/// Result of [`ToolchainDriver::check`]: `status` is `"success"` iff the
/// compiler exited zero; `output` is the concatenated stdout+stderr text.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub output: String,
    pub exit_code: i32,
}

/// Definitions and usages scanned out of `nim check --defusages` output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefUsageResult {
    pub definitions: Vec<String>,
    pub usages: Vec<String>,
}

pub struct ToolchainDriver {
    nim_binary: String,
    timeout: Duration,
}

impl ToolchainDriver {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            nim_binary: config.nim_binary.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    async fn run(&self, project_root: &Path, args: &[&str]) -> Result<String> {
        debug!(nim = %self.nim_binary, ?args, "spawning nim subprocess");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.nim_binary)
                .args(args)
                .current_dir(project_root)
                .output(),
        )
        .await
        .with_context(|| format!("nim {:?} timed out after {:?}", args, self.timeout))?
        .with_context(|| format!("failed to spawn `{}`", self.nim_binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("nim {:?} failed: {}", args, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Type-checks a file without producing a binary. Returns a structured
    /// `{status, output, exitCode}` result rather than raw text — `nim
    /// check` exits non-zero when the file has compile errors, which is a
    /// normal, expected outcome we report rather than an I/O failure.
    pub async fn check(&self, project_root: &Path, file: &str) -> Result<CheckResult> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.nim_binary)
                .args(["check", "--hints:off", file])
                .current_dir(project_root)
                .output(),
        )
        .await
        .with_context(|| format!("nim check timed out after {:?}", self.timeout))?
        .with_context(|| format!("failed to spawn `{}`", self.nim_binary))?;

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        Ok(CheckResult {
            status: if output.status.success() { "success" } else { "error" }.to_string(),
            output: combined,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Generates the JSON documentation blob for a module (`nim jsondoc
    /// --stdout:on`). Without `--stdout:on` the compiler writes a `.json`
    /// file into its output dir and prints nothing to stdout, so this flag
    /// is required, not optional.
    pub async fn extract_json_doc(&self, project_root: &Path, file: &str) -> Result<String> {
        self.run(project_root, &["jsondoc", "--stdout:on", "--hints:off", file])
            .await
    }

    /// Generates the `.idx` index file alongside the given module
    /// (`nim doc --index:on`), then reads it back.
    pub async fn extract_index_file(&self, project_root: &Path, file: &str) -> Result<String> {
        self.run(project_root, &["doc", "--index:on", "--hints:off", file])
            .await?;
        let idx_path = Self::sibling_with_ext(file, "idx");
        tokio::fs::read_to_string(project_root.join(&idx_path))
            .await
            .with_context(|| format!("failed to read generated index file {}", idx_path))
    }

    /// Runs the project-wide doc index pass (`nim doc --index:on --project
    /// <mainFile>`). Unlike [`Self::extract_index_file`], this doesn't read
    /// any particular `.idx` back — the caller walks the project root for
    /// whatever `.idx` files the compiler emitted across the whole module
    /// graph reachable from `main_file`.
    pub async fn generate_project_index(&self, project_root: &Path, main_file: &str) -> Result<()> {
        self.run(project_root, &["doc", "--index:on", "--hints:off", "--project", main_file])
            .await?;
        Ok(())
    }

    /// Generates the module dependency graph (`nim genDepend`), adding
    /// `--path:<projectRoot>/src` when that directory exists so imports
    /// resolved relative to a `src/` layout are found, then reads the
    /// resulting `.dot` file.
    pub async fn gen_depend(&self, project_root: &Path, file: &str) -> Result<String> {
        let src_path = project_root.join("src");
        let path_arg = src_path.is_dir().then(|| format!("--path:{}", src_path.display()));

        let mut args = vec!["genDepend", "--hints:off"];
        if let Some(path_arg) = path_arg.as_deref() {
            args.push(path_arg);
        }
        args.push(file);

        self.run(project_root, &args).await?;
        let dot_path = Self::sibling_with_ext(file, "dot");
        tokio::fs::read_to_string(project_root.join(&dot_path))
            .await
            .with_context(|| format!("failed to read generated dependency graph {}", dot_path))
    }

    /// Runs `nim check` with an extra diagnostic flag (`--defusages:...` or
    /// `--expandMacro:...`) and returns the combined stdout+stderr text
    /// regardless of exit status — like plain `check`, a non-zero exit here
    /// is an expected outcome (the file may not compile), not a failure of
    /// the operation itself.
    async fn run_check_variant(&self, project_root: &Path, file: &str, flag: &str) -> Result<String> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.nim_binary)
                .args(["check", flag, "--hints:off", file])
                .current_dir(project_root)
                .output(),
        )
        .await
        .with_context(|| format!("nim check {flag} timed out after {:?}", self.timeout))?
        .with_context(|| format!("failed to spawn `{}`", self.nim_binary))?;

        Ok(format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ))
    }

    /// Finds the definition and usages of the symbol at `line:col` in
    /// `file` (`nim check --defusages:file,line,col`), scanning the
    /// compiler's output for `def:`/`usage:` marker lines.
    pub async fn find_usages(&self, project_root: &Path, file: &str, line: i64, col: i64) -> Result<DefUsageResult> {
        let flag = format!("--defusages:{file},{line},{col}");
        let output = self.run_check_variant(project_root, file, &flag).await?;
        Ok(scan_def_usage_markers(&output))
    }

    /// Expands macro `name` while compiling `file` (`nim check
    /// --expandMacro:name`) and returns the captured output verbatim.
    pub async fn expand_macro(&self, project_root: &Path, file: &str, name: &str) -> Result<String> {
        let flag = format!("--expandMacro:{name}");
        self.run_check_variant(project_root, file, &flag).await
    }

    /// Dumps the resolved compiler configuration (search paths, defines)
    /// for a project (`nim dump`).
    pub async fn dump_config(&self, project_root: &Path, file: &str) -> Result<String> {
        self.run(project_root, &["dump", "--dump.format:json", file])
            .await
    }

    fn sibling_with_ext(file: &str, ext: &str) -> String {
        let path = PathBuf::from(file);
        path.with_extension(ext).to_string_lossy().into_owned()
    }

    /// Finds the project's main entry file. Search order, first match wins:
    /// 1. A `.nimble` manifest in the root with a `bin` assignment —
    ///    `<binName>.nim` in the root.
    /// 2. Root-level `main.nim`, `app.nim`, `<projectBaseName>.nim`.
    /// 3. The same three candidates under `src/`.
    /// 4. The first `.nim` file found under root, then under `src/`.
    pub fn detect_main_file(project_root: &Path) -> Option<String> {
        if let Some(bin_name) = Self::bin_name_from_manifest(project_root) {
            let candidate = format!("{bin_name}.nim");
            if project_root.join(&candidate).is_file() {
                return Some(candidate);
            }
        }

        let base_name = project_root.file_name()?.to_string_lossy().into_owned();
        let candidates = ["main.nim".to_string(), "app.nim".to_string(), format!("{base_name}.nim")];
        for candidate in &candidates {
            if project_root.join(candidate).is_file() {
                return Some(candidate.clone());
            }
        }
        for candidate in &candidates {
            let under_src = format!("src/{candidate}");
            if project_root.join(&under_src).is_file() {
                return Some(under_src);
            }
        }

        if let Some(first) = Self::first_nim_file(project_root) {
            return Some(first);
        }
        if let Some(first) = Self::first_nim_file(&project_root.join("src")) {
            return Some(format!("src/{first}"));
        }

        warn!(root = %project_root.display(), "could not determine main file");
        None
    }

    /// Looks for a `.nimble` manifest in `project_root` and reads the first
    /// `bin` assignment's quoted value (`bin = "name"` or `bin = @["name",
    /// ...]`).
    fn bin_name_from_manifest(project_root: &Path) -> Option<String> {
        let manifest = std::fs::read_dir(project_root)
            .ok()?
            .filter_map(|e| e.ok())
            .find(|e| e.path().extension().map(|ext| ext == "nimble").unwrap_or(false))?;
        let contents = std::fs::read_to_string(manifest.path()).ok()?;
        contents
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("bin"))
            .find_map(|line| line.split_once('=').and_then(|(_, rhs)| first_quoted(rhs)))
    }

    /// Lexicographically first `.nim` file directly inside `dir`.
    fn first_nim_file(dir: &Path) -> Option<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .ok()?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|ext| ext == "nim").unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names.into_iter().next()
    }
}

fn first_quoted(s: &str) -> Option<String> {
    let start = s.find('"')? + 1;
    let rest = &s[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Scans `nim check --defusages` output for `def:`/`usage:` marker lines,
/// collecting the remainder of each matching line.
fn scan_def_usage_markers(output: &str) -> DefUsageResult {
    let mut result = DefUsageResult::default();
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("def:") {
            result.definitions.push(rest.trim().to_string());
        } else if let Some(rest) = trimmed.strip_prefix("usage:") {
            result.usages.push(rest.trim().to_string());
        } else if let Some(idx) = trimmed.find("def:") {
            result.definitions.push(trimmed[idx + 4..].trim().to_string());
        } else if let Some(idx) = trimmed.find("usage:") {
            result.usages.push(trimmed[idx + 6..].trim().to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sibling_with_ext_replaces_extension() {
        assert_eq!(ToolchainDriver::sibling_with_ext("src/foo.nim", "idx"), "src/foo.idx");
    }

    #[test]
    fn detect_main_file_prefers_dir_name_match() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("widget");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("widget.nim"), "").unwrap();
        fs::write(project.join("other.nim"), "").unwrap();

        assert_eq!(
            ToolchainDriver::detect_main_file(&project),
            Some("widget.nim".to_string())
        );
    }

    #[test]
    fn detect_main_file_falls_back_to_sole_top_level_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("proj");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("lonely.nim"), "").unwrap();

        assert_eq!(
            ToolchainDriver::detect_main_file(&project),
            Some("lonely.nim".to_string())
        );
    }

    #[test]
    fn detect_main_file_falls_back_to_first_file_when_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("ambiguous");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("b.nim"), "").unwrap();
        fs::write(project.join("a.nim"), "").unwrap();

        assert_eq!(
            ToolchainDriver::detect_main_file(&project),
            Some("a.nim".to_string())
        );
    }

    #[test]
    fn detect_main_file_prefers_nimble_bin_name() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("pkg");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("pkg.nimble"), "bin = @[\"pkgmain\"]\n").unwrap();
        fs::write(project.join("pkgmain.nim"), "").unwrap();
        fs::write(project.join("pkg.nim"), "").unwrap();

        assert_eq!(
            ToolchainDriver::detect_main_file(&project),
            Some("pkgmain.nim".to_string())
        );
    }

    #[test]
    fn detect_main_file_checks_src_when_root_candidates_absent() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("pkg2");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src/main.nim"), "").unwrap();

        assert_eq!(
            ToolchainDriver::detect_main_file(&project),
            Some("src/main.nim".to_string())
        );
    }
}
