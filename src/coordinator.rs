//! Coordinator: single-mutex in-memory server state.
//!
//! Every tool invocation serializes through one `tokio::sync::Mutex`-guarded
//! state block. This is a deliberate single-node, non-distributed
//! concurrency model (see SPEC_FULL.md / spec.md §5): correctness over
//! throughput, since a Nim workspace's compiler subprocess calls already
//! dominate wall-clock time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::Project;
use crate::packages::{self, PackageInfo};

struct CoordinatorState {
    projects: HashMap<String, Project>,
    packages: Vec<PackageInfo>,
    packages_loaded: bool,
    query_cache: HashMap<String, Value>,
}

pub struct Coordinator {
    config: Arc<Config>,
    state: Mutex<CoordinatorState>,
}

impl Coordinator {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            state: Mutex::new(CoordinatorState {
                projects: HashMap::new(),
                packages: Vec::new(),
                packages_loaded: false,
                query_cache: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Opens (or returns the already-open) project at `root_path`, detecting
    /// its main file via the toolchain's heuristic.
    pub async fn open_workspace(&self, project_id: &str, root_path: &str) -> Project {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.projects.get(project_id) {
            return existing.clone();
        }

        let main_file = crate::toolchain::ToolchainDriver::detect_main_file(std::path::Path::new(root_path));
        let project = Project {
            id: project_id.to_string(),
            root_path: root_path.to_string(),
            main_file,
            opened_at: Utc::now(),
        };
        state.projects.insert(project_id.to_string(), project.clone());
        project
    }

    pub async fn get_project(&self, project_id: &str) -> Option<Project> {
        self.state.lock().await.projects.get(project_id).cloned()
    }

    pub async fn list_projects(&self) -> Vec<Project> {
        self.state.lock().await.projects.values().cloned().collect()
    }

    /// Returns the package catalog, loading it from disk on first access.
    pub async fn packages(&self) -> Vec<PackageInfo> {
        let mut state = self.state.lock().await;
        if !state.packages_loaded {
            state.packages = packages::discover_packages();
            state.packages_loaded = true;
        }
        state.packages.clone()
    }

    /// Cache key convention: `"{query}:{project_id}:{mode}"` for search
    /// results, `"info:{name}:{project_id}"` for symbol lookups.
    pub async fn cache_get(&self, key: &str) -> Option<Value> {
        self.state.lock().await.query_cache.get(key).cloned()
    }

    pub async fn cache_put(&self, key: String, value: Value) {
        let mut state = self.state.lock().await;
        if state.query_cache.len() >= self.config.coordinator.query_cache_capacity {
            state.query_cache.clear();
        }
        state.query_cache.insert(key, value);
    }

    pub async fn cache_clear(&self) {
        self.state.lock().await.query_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoordinatorConfig, DbConfig, EmbeddingConfig, RetrievalConfig, ServerConfig, ToolchainConfig};

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            db: DbConfig { url: "mysql://x".to_string(), max_connections: 1 },
            toolchain: ToolchainConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            server: ServerConfig { bind: "127.0.0.1:0".to_string() },
            coordinator: CoordinatorConfig { query_cache_capacity: 2 },
        })
    }

    #[tokio::test]
    async fn open_workspace_is_idempotent() {
        let coord = Coordinator::new(test_config());
        let a = coord.open_workspace("p1", "/tmp/proj").await;
        let b = coord.open_workspace("p1", "/tmp/proj").await;
        assert_eq!(a.opened_at, b.opened_at);
    }

    #[tokio::test]
    async fn cache_evicts_when_full() {
        let coord = Coordinator::new(test_config());
        coord.cache_put("a".into(), serde_json::json!(1)).await;
        coord.cache_put("b".into(), serde_json::json!(2)).await;
        coord.cache_put("c".into(), serde_json::json!(3)).await;
        // eviction on overflow is a clear-all, so "a" should be gone by now
        // while "c" (the entry that triggered eviction) remains.
        assert!(coord.cache_get("c").await.is_some());
    }
}
