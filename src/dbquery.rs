//! External database passthrough query tool.
//!
//! Out-of-scope-but-present plumbing: agents sometimes need to run a
//! read-only query against the same project database NimGenie already
//! maintains a connection to (e.g. to cross-reference symbol rows by
//! hand). This is a thin wrapper, not a query language of its own —
//! callers supply a complete SQL statement.

use serde_json::Value;

use crate::store::SymbolStore;

/// Runs `sql` against the shared pool and returns rows as a JSON array, or
/// an `{"error": ...}` object on failure. Never panics or propagates `Err`
/// to the dispatcher.
pub async fn run_query(store: &SymbolStore, sql: &str) -> Value {
    match store.run_raw_query(sql).await {
        Ok(rows) => serde_json::json!({ "rows": rows }),
        Err(message) => serde_json::json!({ "error": message }),
    }
}
