//! Core data models for the indexed Nim workspace.
//!
//! These types represent the symbols, modules, and dependency edges that
//! flow from the toolchain driver and doc parser into the symbol store, plus
//! the in-memory coordinator state tracked per opened project.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single documented Nim symbol (proc, type, const, template, ...).
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRecord {
    pub project_id: String,
    pub name: String,
    pub kind: String,
    pub module: String,
    pub file_path: String,
    pub line: i64,
    pub col: i64,
    pub signature: Option<String>,
    pub documentation: Option<String>,
    pub exported: bool,
    pub deprecated: bool,
    pub created: DateTime<Utc>,
}

/// A Nim module discovered while indexing a project.
///
/// Insert-or-update by `(project_id, name)`: `file_path`, `last_modified`,
/// and `documentation` are overwritten on a repeat insert.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub project_id: String,
    pub name: String,
    pub file_path: String,
    pub documentation: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub created: DateTime<Utc>,
}

/// A directed edge in the import dependency graph: `source` imports `target`.
#[derive(Debug, Clone, Serialize)]
pub struct FileDependency {
    pub project_id: String,
    pub source_file: String,
    pub target_file: String,
    pub created: DateTime<Utc>,
}

/// Content hash and mtime recorded for a source file at last index time.
///
/// Used to decide whether a file needs re-indexing and to drive the
/// reverse-dependency cascade when a file changes.
#[derive(Debug, Clone, Serialize)]
pub struct FileModification {
    pub project_id: String,
    pub file_path: String,
    pub content_hash: String,
    pub modified_at: DateTime<Utc>,
}

/// An extra directory an agent has registered for static-file access
/// (generated docs, coverage reports, and the like).
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredDirectory {
    pub project_id: String,
    pub alias: String,
    pub path: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

/// Metadata about the embedding model/dimensionality in effect for a project,
/// recorded so a dimension change can be detected and surfaced as an error
/// rather than silently corrupting a `VECTOR(D)` column. One row per
/// `(project_id, embedding_type)` — the four vector kinds are tracked
/// independently since a batch can regenerate just one of them.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingMetadata {
    pub project_id: String,
    pub model: String,
    pub dims: usize,
    pub embedding_type: String,
    pub total_symbols: i64,
    pub updated_at: DateTime<Utc>,
}

/// In-memory handle to an opened Nim project, held by the coordinator.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub root_path: String,
    pub main_file: Option<String>,
    pub opened_at: DateTime<Utc>,
}
