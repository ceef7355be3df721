//! Pure parsers for the Nim toolchain's textual outputs.
//!
//! Nothing here touches the filesystem or spawns anything — each function
//! takes a string the toolchain driver already captured and returns
//! structured records. Kept separate from `toolchain.rs` so the parsing
//! logic can be unit-tested against fixed strings without a `nim` binary.

use chrono::Utc;
use serde_json::Value;

use crate::models::SymbolRecord;

/// Parses the JSON blob produced by `nim jsondoc` into symbol records.
pub fn parse_json_doc(project_id: &str, module: &str, file_path: &str, json: &str) -> Vec<SymbolRecord> {
    let root: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let entries = match root.get("entries").and_then(|e| e.as_array()) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let now = Utc::now();
    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?.to_string();
            let kind = entry
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("unknown")
                .to_string();
            let line = entry.get("line").and_then(|l| l.as_i64()).unwrap_or(0);
            let col = entry.get("col").and_then(|c| c.as_i64()).unwrap_or(0);
            let signature = entry
                .get("signature")
                .and_then(reconstruct_signature)
                .or_else(|| entry.get("code").and_then(|s| s.as_str()).map(|s| s.to_string()));
            let documentation = entry
                .get("description")
                .or_else(|| entry.get("comment"))
                .and_then(|d| d.as_str())
                .filter(|d| !d.is_empty())
                .map(|s| s.to_string());
            let deprecated = signature
                .as_deref()
                .map(|s| s.contains("{.deprecated"))
                .unwrap_or(false);

            Some(SymbolRecord {
                project_id: project_id.to_string(),
                name,
                kind,
                module: module.to_string(),
                file_path: file_path.to_string(),
                line,
                col,
                signature,
                documentation,
                exported: true,
                deprecated,
                created: now,
            })
        })
        .collect()
}

/// Reconstructs a `signature` field from the doc JSON, which is either a
/// plain string (taken verbatim) or a structured object with optional
/// `return`, `arguments: [{name, type}, ...]`, and `pragmas: [...]`. The
/// object form is reconstructed as `"return: R; args: (n1: T1, n2: T2);
/// pragmas: p1, p2"`, omitting any section that's empty and joining the
/// remaining ones with `"; "`.
fn reconstruct_signature(value: &Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    let obj = value.as_object()?;

    let mut sections = Vec::new();

    if let Some(ret) = obj.get("return").and_then(|r| r.as_str()).filter(|r| !r.is_empty()) {
        sections.push(format!("return: {ret}"));
    }

    if let Some(args) = obj.get("arguments").and_then(|a| a.as_array()) {
        let rendered: Vec<String> = args
            .iter()
            .filter_map(|arg| {
                let name = arg.get("name")?.as_str()?;
                let ty = arg.get("type").and_then(|t| t.as_str()).unwrap_or("");
                Some(format!("{name}: {ty}"))
            })
            .collect();
        if !rendered.is_empty() {
            sections.push(format!("args: ({})", rendered.join(", ")));
        }
    }

    if let Some(pragmas) = obj.get("pragmas").and_then(|p| p.as_array()) {
        let rendered: Vec<&str> = pragmas.iter().filter_map(|p| p.as_str()).collect();
        if !rendered.is_empty() {
            sections.push(format!("pragmas: {}", rendered.join(", ")));
        }
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("; "))
    }
}

/// Entry-type whitelist for `.idx` rows. Only these are real symbol
/// entries; everything else (group headers, table-of-contents rows) is
/// noise from the doc tool's generic index format.
const IDX_ENTRY_WHITELIST: &[&str] = &["nimgrp", "nimsym"];

/// Parses a Nim `.idx` index file: tab-separated lines with exactly six
/// fields `entryType<TAB>name<TAB>filePath<TAB>line<TAB>column<TAB>description`.
/// Lines are skipped if blank or their `entryType` isn't in
/// [`IDX_ENTRY_WHITELIST`].
///
/// `.idx` files don't carry a `project_id` of their own — the caller
/// supplies it (the `module`/`file_path` fields come from the row itself).
pub fn parse_idx_file(project_id: &str, module: &str, contents: &str) -> Vec<SymbolRecord> {
    let now = Utc::now();
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 6 {
                return None;
            }
            let [entry_type, name, file_path, line_no, column, description] = [
                fields[0], fields[1], fields[2], fields[3], fields[4], fields[5],
            ];
            if !IDX_ENTRY_WHITELIST.contains(&entry_type) {
                return None;
            }
            if name.is_empty() {
                return None;
            }

            Some(SymbolRecord {
                project_id: project_id.to_string(),
                name: name.to_string(),
                kind: "unknown".to_string(),
                module: module.to_string(),
                file_path: file_path.to_string(),
                line: line_no.parse().unwrap_or(0),
                col: column.parse().unwrap_or(0),
                signature: None,
                documentation: Some(description).filter(|d| !d.is_empty()).map(|s| s.to_string()),
                exported: true,
                deprecated: false,
                created: now,
            })
        })
        .collect()
}

/// Parses a Graphviz `.dot` dependency graph (`nim genDepend`) into
/// `(source, target)` edges. Only `"a" -> "b";`-shaped lines are recognized;
/// everything else (graph attributes, comments) is ignored.
pub fn parse_depend_dot(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_end_matches(';');
            let (lhs, rhs) = line.split_once("->")?;
            let source = unquote(lhs.trim());
            let target = unquote(rhs.trim());
            if source.is_empty() || target.is_empty() {
                return None;
            }
            Some((source, target))
        })
        .collect()
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_doc_extracts_entries() {
        let json = r#"{
            "entries": [
                {"name": "foo", "type": "proc", "line": 10, "col": 5,
                 "signature": "proc foo(x: int): int", "description": "adds one"},
                {"name": "Bar", "type": "type", "line": 20, "col": 1}
            ]
        }"#;
        let symbols = parse_json_doc("p1", "mymod", "mymod.nim", json);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "foo");
        assert_eq!(symbols[0].kind, "proc");
        assert_eq!(symbols[0].documentation.as_deref(), Some("adds one"));
        assert_eq!(symbols[1].name, "Bar");
        assert!(symbols[1].documentation.is_none());
    }

    #[test]
    fn parse_json_doc_handles_malformed_input() {
        assert!(parse_json_doc("p1", "m", "m.nim", "not json").is_empty());
        assert!(parse_json_doc("p1", "m", "m.nim", "{}").is_empty());
    }

    #[test]
    fn parse_json_doc_reconstructs_object_signature() {
        let json = r#"{"entries": [{"name": "foo", "type": "proc",
            "signature": {"return": "int", "arguments": [{"name": "x", "type": "int"}]}}]}"#;
        let symbols = parse_json_doc("p1", "m", "m.nim", json);
        assert_eq!(symbols[0].signature.as_deref(), Some("return: int; args: (x: int)"));
    }

    #[test]
    fn parse_json_doc_flags_deprecated() {
        let json = r#"{"entries": [{"name": "old", "type": "proc", "signature": "proc old() {.deprecated.}"}]}"#;
        let symbols = parse_json_doc("p1", "m", "m.nim", json);
        assert!(symbols[0].deprecated);
    }

    #[test]
    fn parse_idx_file_skips_non_whitelisted_entry_types() {
        let contents = "nimsym\tfoo\tmymod.nim\t10\t2\tdoes a thing\n\
                         nimgrp\tbar\tmymod.nim\t20\t0\t\n\
                         toc\tbaz\tmymod.nim\t30\t0\tignored\n";
        let symbols = parse_idx_file("p1", "mymod", contents);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "foo");
        assert_eq!(symbols[0].line, 10);
        assert_eq!(symbols[0].col, 2);
        assert_eq!(symbols[0].documentation.as_deref(), Some("does a thing"));
        assert_eq!(symbols[1].name, "bar");
        assert!(symbols[1].documentation.is_none());
    }

    #[test]
    fn parse_idx_file_skips_blank_and_malformed_lines() {
        let contents = "\nnimsym\tonly\tthree\tfields\n";
        assert!(parse_idx_file("p1", "mymod", contents).is_empty());
    }

    #[test]
    fn reconstruct_signature_handles_string_and_object_forms() {
        assert_eq!(
            reconstruct_signature(&serde_json::json!("proc foo(x: int): int")),
            Some("proc foo(x: int): int".to_string())
        );

        let obj = serde_json::json!({
            "return": "int",
            "arguments": [{"name": "x", "type": "int"}, {"name": "y", "type": "string"}],
            "pragmas": ["inline", "noSideEffect"]
        });
        assert_eq!(
            reconstruct_signature(&obj),
            Some("return: int; args: (x: int, y: string); pragmas: inline, noSideEffect".to_string())
        );

        let sparse = serde_json::json!({ "arguments": [] });
        assert_eq!(reconstruct_signature(&sparse), None);
    }

    #[test]
    fn parse_depend_dot_extracts_edges() {
        let dot = "digraph dependencies {\n  \"a\" -> \"b\";\n  \"b\" -> \"c\";\n}\n";
        let edges = parse_depend_dot(dot);
        assert_eq!(edges, vec![("a".to_string(), "b".to_string()), ("b".to_string(), "c".to_string())]);
    }

    #[test]
    fn parse_depend_dot_ignores_non_edge_lines() {
        let dot = "digraph dependencies {\n  rankdir=LR;\n}\n";
        assert!(parse_depend_dot(dot).is_empty());
    }
}
