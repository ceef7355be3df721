//! The `Tool` trait and its built-in implementations.
//!
//! Every MCP tool NimGenie exposes — indexing, search, syntax checking, and
//! the out-of-scope-but-present package/directory/database plumbing — is a
//! `Tool` registered in a `ToolRegistry`. `mcp.rs` bridges this registry to
//! `rmcp`'s protocol types; nothing in here knows about MCP wire formats.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::coordinator::Coordinator;
use crate::dbquery;
use crate::embedding::EmbeddingClient;
use crate::indexer::Indexer;
use crate::progress::TracingProgress;
use crate::store::SymbolStore;
use crate::toolchain::ToolchainDriver;

/// Context bridge for tool execution, created once at server startup and
/// shared across all tool invocations behind `Arc`s.
pub struct ToolContext {
    pub coordinator: Arc<Coordinator>,
    pub store: Arc<SymbolStore>,
    pub toolchain: Arc<ToolchainDriver>,
    pub embedding: Option<Arc<EmbeddingClient>>,
}

impl ToolContext {
    fn indexer(&self) -> Indexer<'_> {
        let config = self.coordinator.config();
        Indexer::with_config(
            &self.toolchain,
            &self.store,
            self.embedding.as_deref(),
            config.embedding.dims,
            config.indexing.enable_dependency_tracking,
        )
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

fn require_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("`{}` must be a non-empty string", field))
}

fn project_id(params: &Value) -> String {
    params
        .get("project_id")
        .and_then(|v| v.as_str())
        .unwrap_or("default")
        .to_string()
}

fn project_root<'a>(params: &'a Value) -> Result<&'a str> {
    require_str(params, "project_root")
}

pub struct IndexCurrentProjectTool;

#[async_trait]
impl Tool for IndexCurrentProjectTool {
    fn name(&self) -> &str {
        "indexCurrentProject"
    }

    fn description(&self) -> &str {
        "Index every Nim source file in the current project"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_root": { "type": "string" },
                "project_id": { "type": "string" }
            },
            "required": ["project_root"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let root = project_root(&params)?;
        let pid = project_id(&params);
        ctx.coordinator.open_workspace(&pid, root).await;

        let reporter = TracingProgress;
        let outcome = ctx
            .indexer()
            .index_project_with_progress(&pid, Path::new(root), Some(&reporter), None)
            .await?;
        // Cleared after the run, not before: a query cache populated while
        // indexing is in flight would otherwise survive into the new state.
        ctx.coordinator.cache_clear().await;
        Ok(json!({ "indexedSymbols": outcome.symbols, "cancelled": outcome.cancelled }))
    }
}

pub struct IndexProjectDependenciesOnlyTool;

#[async_trait]
impl Tool for IndexProjectDependenciesOnlyTool {
    fn name(&self) -> &str {
        "indexProjectDependenciesOnly"
    }

    fn description(&self) -> &str {
        "Re-extract only the module dependency graph, without re-indexing symbols"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_root": { "type": "string" },
                "project_id": { "type": "string" }
            },
            "required": ["project_root"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let root = project_root(&params)?;
        let pid = project_id(&params);
        let main_file = ToolchainDriver::detect_main_file(Path::new(root))
            .ok_or_else(|| anyhow::anyhow!("could not determine project main file"))?;

        let edges = ctx
            .indexer()
            .parse_and_store_dependencies(&pid, Path::new(root), &main_file)
            .await?;
        Ok(json!({ "dependencyEdges": edges }))
    }
}

pub struct SearchSymbolsTool;

#[async_trait]
impl Tool for SearchSymbolsTool {
    fn name(&self) -> &str {
        "searchSymbols"
    }

    fn description(&self) -> &str {
        "Search indexed symbols by substring match on name"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "project_id": { "type": "string" },
                "limit": { "type": "integer", "default": 25 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = require_str(&params, "query")?;
        let pid = project_id(&params);
        let limit = params.get("limit").and_then(|v| v.as_i64()).unwrap_or(25);

        let cache_key = format!("{}:{}:search", query, pid);
        if let Some(cached) = ctx.coordinator.cache_get(&cache_key).await {
            return Ok(cached);
        }

        let hits = ctx.store.search_symbols(&pid, query, limit).await;
        let result = json!({ "results": hits });
        ctx.coordinator.cache_put(cache_key, result.clone()).await;
        Ok(result)
    }
}

pub struct GetSymbolInfoTool;

#[async_trait]
impl Tool for GetSymbolInfoTool {
    fn name(&self) -> &str {
        "getSymbolInfo"
    }

    fn description(&self) -> &str {
        "Retrieve full information for a symbol by exact name"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "project_id": { "type": "string" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let name = require_str(&params, "name")?;
        let pid = project_id(&params);

        let cache_key = format!("info:{}:{}", name, pid);
        if let Some(cached) = ctx.coordinator.cache_get(&cache_key).await {
            return Ok(cached);
        }

        let result = ctx.store.get_symbol_info(&pid, name).await;
        ctx.coordinator.cache_put(cache_key, result.clone()).await;
        Ok(result)
    }
}

pub struct SemanticSearchSymbolsTool;

#[async_trait]
impl Tool for SemanticSearchSymbolsTool {
    fn name(&self) -> &str {
        "semanticSearchSymbols"
    }

    fn description(&self) -> &str {
        "Search symbols by embedding similarity over one of the four vector kinds"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "vector_kind": { "type": "string", "enum": ["documentation", "signature", "name", "combined"], "default": "combined" },
                "project_id": { "type": "string" },
                "limit": { "type": "integer", "default": 10 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = require_str(&params, "query")?;
        let pid = project_id(&params);
        let vector_kind = params.get("vector_kind").and_then(|v| v.as_str()).unwrap_or("combined");
        let limit = params.get("limit").and_then(|v| v.as_i64()).unwrap_or(10);

        let embedding = ctx
            .embedding
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("embedding service is not configured"))?;

        let symbol = crate::models::SymbolRecord {
            project_id: pid.clone(),
            name: query.to_string(),
            kind: String::new(),
            module: String::new(),
            file_path: String::new(),
            line: 0,
            col: 0,
            signature: None,
            documentation: Some(query.to_string()),
            exported: true,
            deprecated: false,
            created: chrono::Utc::now(),
        };
        let vectors = embedding.embed_symbol(&symbol, None).await;
        let query_vector = vectors
            .combined
            .or(vectors.documentation)
            .ok_or_else(|| anyhow::anyhow!("embedding request failed"))?;

        let hits = ctx
            .store
            .semantic_search_symbols(&pid, &query_vector, vector_kind, limit)
            .await;
        Ok(json!({ "results": hits }))
    }
}

pub struct FindSimilarSymbolsTool;

#[async_trait]
impl Tool for FindSimilarSymbolsTool {
    fn name(&self) -> &str {
        "findSimilarSymbols"
    }

    fn description(&self) -> &str {
        "Find symbols whose combined embedding is nearest to a given symbol's"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "project_id": { "type": "string" },
                "limit": { "type": "integer", "default": 10 }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let name = require_str(&params, "name")?;
        let pid = project_id(&params);
        let limit = params.get("limit").and_then(|v| v.as_i64()).unwrap_or(10);

        let hits = ctx.store.find_similar_symbols(&pid, name, limit).await;
        Ok(json!({ "results": hits }))
    }
}

pub struct SearchByExampleTool;

#[async_trait]
impl Tool for SearchByExampleTool {
    fn name(&self) -> &str {
        "searchByExample"
    }

    fn description(&self) -> &str {
        "Semantic search seeded by an example code snippet rather than a plain query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": { "type": "string" },
                "project_id": { "type": "string" },
                "limit": { "type": "integer", "default": 10 }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let code = require_str(&params, "code")?;
        let pid = project_id(&params);
        let limit = params.get("limit").and_then(|v| v.as_i64()).unwrap_or(10);

        let embedding = ctx
            .embedding
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("embedding service is not configured"))?;

        let symbol = crate::models::SymbolRecord {
            project_id: pid.clone(),
            name: String::new(),
            kind: String::new(),
            module: String::new(),
            file_path: String::new(),
            line: 0,
            col: 0,
            signature: Some(code.to_string()),
            documentation: None,
            exported: true,
            deprecated: false,
            created: chrono::Utc::now(),
        };
        let vectors = embedding.embed_symbol(&symbol, None).await;
        let query_vector = vectors
            .signature
            .ok_or_else(|| anyhow::anyhow!("embedding request failed"))?;

        let hits = ctx
            .store
            .semantic_search_symbols(&pid, &query_vector, "signature", limit)
            .await;
        Ok(json!({ "results": hits }))
    }
}

pub struct GenerateEmbeddingsTool;

#[async_trait]
impl Tool for GenerateEmbeddingsTool {
    fn name(&self) -> &str {
        "generateEmbeddings"
    }

    fn description(&self) -> &str {
        "Generate (or regenerate) embeddings for all symbols missing vectors in a project"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string" }
            },
            "required": []
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let pid = project_id(&params);
        let embedding = ctx
            .embedding
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("embedding service is not configured"))?;

        let hits = ctx.store.search_symbols(&pid, "", 10_000).await;
        let mut updated = 0;
        for hit in &hits {
            let symbol = crate::models::SymbolRecord {
                project_id: pid.clone(),
                name: hit.name.clone(),
                kind: hit.kind.clone(),
                module: hit.module.clone(),
                file_path: hit.file_path.clone(),
                line: hit.line,
                col: hit.col,
                signature: hit.signature.clone(),
                documentation: hit.documentation.clone(),
                exported: true,
                deprecated: false,
                created: chrono::Utc::now(),
            };
            let vectors = embedding.embed_symbol(&symbol, None).await;
            let ok = ctx
                .store
                .update_symbol_embeddings(
                    hit.id,
                    vectors.documentation.as_deref(),
                    vectors.signature.as_deref(),
                    vectors.name.as_deref(),
                    vectors.combined.as_deref(),
                )
                .await;
            if ok {
                updated += 1;
            }
        }
        Ok(json!({ "updatedSymbols": updated }))
    }
}

pub struct GetEmbeddingStatsTool;

#[async_trait]
impl Tool for GetEmbeddingStatsTool {
    fn name(&self) -> &str {
        "getEmbeddingStats"
    }

    fn description(&self) -> &str {
        "Report embedding coverage for a project"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "project_id": { "type": "string" } }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(ctx.store.embedding_stats(&project_id(&params)).await)
    }
}

pub struct GetProjectStatsTool;

#[async_trait]
impl Tool for GetProjectStatsTool {
    fn name(&self) -> &str {
        "getProjectStats"
    }

    fn description(&self) -> &str {
        "Report symbol, module, and dependency counts for a project"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "project_id": { "type": "string" } }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(ctx.store.project_stats(&project_id(&params)).await)
    }
}

pub struct CheckSyntaxTool;

#[async_trait]
impl Tool for CheckSyntaxTool {
    fn name(&self) -> &str {
        "checkSyntax"
    }

    fn description(&self) -> &str {
        "Type-check a Nim file and return compiler diagnostics"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_root": { "type": "string" },
                "file": { "type": "string" }
            },
            "required": ["project_root", "file"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let root = project_root(&params)?;
        let file = require_str(&params, "file")?;
        let result = ctx.toolchain.check(Path::new(root), file).await?;
        Ok(json!({ "status": result.status, "output": result.output, "exitCode": result.exit_code }))
    }
}

pub struct ListPackagesTool;

#[async_trait]
impl Tool for ListPackagesTool {
    fn name(&self) -> &str {
        "listPackages"
    }

    fn description(&self) -> &str {
        "List Nimble packages available in the local package cache"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let packages = ctx.coordinator.packages().await;
        Ok(json!({ "packages": packages }))
    }
}

pub struct RegisterDirectoryTool;

#[async_trait]
impl Tool for RegisterDirectoryTool {
    fn name(&self) -> &str {
        "registerDirectory"
    }

    fn description(&self) -> &str {
        "Register an extra directory for static-file access over the HTTP server"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "alias": { "type": "string" },
                "path": { "type": "string" },
                "description": { "type": "string" },
                "project_id": { "type": "string" }
            },
            "required": ["alias", "path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let alias = require_str(&params, "alias")?;
        let path = require_str(&params, "path")?;
        let description = params.get("description").and_then(|v| v.as_str()).map(|s| s.to_string());
        let pid = project_id(&params);

        let dir = crate::models::RegisteredDirectory {
            project_id: pid,
            alias: alias.to_string(),
            path: path.to_string(),
            description,
            created: chrono::Utc::now(),
        };
        let ok = ctx.store.insert_registered_directory(&dir).await;
        Ok(json!({ "registered": ok }))
    }
}

pub struct RunDatabaseQueryTool;

#[async_trait]
impl Tool for RunDatabaseQueryTool {
    fn name(&self) -> &str {
        "runDatabaseQuery"
    }

    fn description(&self) -> &str {
        "Run a parameterless read query against the project database"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "sql": { "type": "string" } },
            "required": ["sql"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let sql = require_str(&params, "sql")?;
        Ok(dbquery::run_query(&ctx.store, sql).await)
    }
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(IndexCurrentProjectTool));
        registry.register(Box::new(IndexProjectDependenciesOnlyTool));
        registry.register(Box::new(SearchSymbolsTool));
        registry.register(Box::new(GetSymbolInfoTool));
        registry.register(Box::new(SemanticSearchSymbolsTool));
        registry.register(Box::new(FindSimilarSymbolsTool));
        registry.register(Box::new(SearchByExampleTool));
        registry.register(Box::new(GenerateEmbeddingsTool));
        registry.register(Box::new(GetEmbeddingStatsTool));
        registry.register(Box::new(GetProjectStatsTool));
        registry.register(Box::new(CheckSyntaxTool));
        registry.register(Box::new(ListPackagesTool));
        registry.register(Box::new(RegisterDirectoryTool));
        registry.register(Box::new(RunDatabaseQueryTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_builtins_registers_every_spec_tool() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 14);
        assert!(registry.find("searchSymbols").is_some());
        assert!(registry.find("checkSyntax").is_some());
        assert!(registry.find("nonexistent").is_none());
    }
}
