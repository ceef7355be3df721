//! Indexing progress reporting.
//!
//! Reports observable progress during `indexProject`/`updateIndex` so a
//! long-running MCP tool call can stream stage updates instead of going
//! silent until completion. The CLI path writes to **stderr** (human or
//! JSON) so stdout stays parseable for piping; the MCP path logs the same
//! events through `tracing` rather than stdout/stderr, since the server
//! process's stderr isn't surfaced to the MCP client.

use std::io::Write;

use tracing::info;

/// A single indexing stage, matching the vocabulary streamed to MCP
/// clients: starting, cleanup, discovery, dependencies, indexing,
/// project-wide (embedding) pass, completed, error, or cancelled.
#[derive(Clone, Debug)]
pub enum IndexStage {
    Starting,
    Cleanup,
    Discovery,
    Dependencies,
    Indexing { file: String, n: u64, total: u64 },
    ProjectWide,
    /// A non-fatal problem that doesn't abort the batch (e.g. `genDepend`
    /// or the project-wide doc-index pass failing) — the run continues,
    /// but a streaming client should still be told about it (§6).
    Warning { message: String },
    Completed { symbols: u64 },
    Error { message: String },
    Cancelled,
}

/// Reports indexing progress. Implementations write to stderr (human or
/// JSON) or forward to an MCP progress notification sink.
pub trait IndexProgressReporter: Send + Sync {
    fn report(&self, stage: IndexStage);
}

/// Human-friendly progress on stderr.
pub struct StderrProgress;

impl IndexProgressReporter for StderrProgress {
    fn report(&self, stage: IndexStage) {
        let line = match &stage {
            IndexStage::Starting => "indexing  starting...\n".to_string(),
            IndexStage::Cleanup => "indexing  cleaning up previous symbols...\n".to_string(),
            IndexStage::Discovery => "indexing  discovering source files...\n".to_string(),
            IndexStage::Dependencies => "indexing  extracting dependency graph...\n".to_string(),
            IndexStage::Indexing { file, n, total } => {
                format!("indexing  {} / {}  {}\n", format_number(*n), format_number(*total), file)
            }
            IndexStage::ProjectWide => "indexing  generating embeddings...\n".to_string(),
            IndexStage::Warning { message } => format!("indexing  warning: {}\n", message),
            IndexStage::Completed { symbols } => {
                format!("indexing  completed  {} symbols\n", format_number(*symbols))
            }
            IndexStage::Error { message } => format!("indexing  error: {}\n", message),
            IndexStage::Cancelled => "indexing  cancelled\n".to_string(),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgressReporter for JsonProgress {
    fn report(&self, stage: IndexStage) {
        let obj = match &stage {
            IndexStage::Starting => serde_json::json!({ "event": "progress", "stage": "starting" }),
            IndexStage::Cleanup => serde_json::json!({ "event": "progress", "stage": "cleanup" }),
            IndexStage::Discovery => serde_json::json!({ "event": "progress", "stage": "discovery" }),
            IndexStage::Dependencies => serde_json::json!({ "event": "progress", "stage": "dependencies" }),
            IndexStage::Indexing { file, n, total } => serde_json::json!({
                "event": "progress", "stage": "indexing", "file": file, "n": n, "total": total
            }),
            IndexStage::ProjectWide => serde_json::json!({ "event": "progress", "stage": "project_wide" }),
            IndexStage::Warning { message } => serde_json::json!({
                "event": "progress", "stage": "warning", "message": message
            }),
            IndexStage::Completed { symbols } => serde_json::json!({
                "event": "progress", "stage": "completed", "symbols": symbols
            }),
            IndexStage::Error { message } => serde_json::json!({
                "event": "progress", "stage": "error", "message": message
            }),
            IndexStage::Cancelled => serde_json::json!({ "event": "progress", "stage": "cancelled" }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// Logs each stage through `tracing::info!`, for the MCP/server path where
/// there's no terminal to write progress lines to.
pub struct TracingProgress;

impl IndexProgressReporter for TracingProgress {
    fn report(&self, stage: IndexStage) {
        match stage {
            IndexStage::Starting => info!("indexing started"),
            IndexStage::Cleanup => info!("cleaning up previous symbols"),
            IndexStage::Discovery => info!("discovering source files"),
            IndexStage::Dependencies => info!("extracting dependency graph"),
            IndexStage::Indexing { file, n, total } => info!(file, n, total, "indexing file"),
            IndexStage::ProjectWide => info!("running project-wide doc index pass"),
            IndexStage::Warning { message } => tracing::warn!(message, "indexing warning"),
            IndexStage::Completed { symbols } => info!(symbols, "indexing completed"),
            IndexStage::Error { message } => tracing::error!(message, "indexing error"),
            IndexStage::Cancelled => info!("indexing cancelled"),
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl IndexProgressReporter for NoProgress {
    fn report(&self, _stage: IndexStage) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IndexProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
