//! # NimGenie
//!
//! An MCP server exposing a Nim workspace (source tree + Nimble package
//! cache) as tools an AI agent can invoke: index symbols, search lexically
//! or semantically, check syntax, and query external databases.
//!
//! ## Architecture
//!
//! ```text
//! nim toolchain → Doc Parser → Indexer → Symbol Store (VECTOR columns) → Tools → MCP / CLI
//! ```
//!
//! ## Modules
//!
//! - [`config`] — TOML configuration parsing and validation
//! - [`models`] — Core data types: `SymbolRecord`, `Module`, `FileDependency`, ...
//! - [`toolchain`] — Nim compiler subprocess driver
//! - [`docparser`] — Pure parsers for jsondoc/idx/dot compiler output
//! - [`embedding`] — Embedding HTTP client and vector utilities
//! - [`db`] — MySQL-wire connection pool
//! - [`migrate`] — Database schema migrations
//! - [`store`] — Symbol persistence, lexical and semantic search
//! - [`indexer`] — Full and incremental project indexing
//! - [`coordinator`] — In-memory server state
//! - [`traits`] — `Tool` trait and built-in MCP tools
//! - [`server`] — MCP-compatible HTTP server (Axum + rmcp)

mod config;
mod coordinator;
mod db;
mod dbquery;
mod dirquery;
mod docparser;
mod embedding;
mod indexer;
mod mcp;
mod migrate;
mod models;
mod packages;
mod progress;
mod server;
mod stats;
mod store;
mod toolchain;
mod traits;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use embedding::EmbeddingClient;
use indexer::Indexer;
use progress::ProgressMode;
use store::SymbolStore;
use toolchain::ToolchainDriver;

#[derive(Parser)]
#[command(
    name = "nimgenie",
    about = "NimGenie — MCP server exposing a Nim workspace to AI agents",
    version
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./config/nimgenie.toml")]
    config: PathBuf,

    /// Project identifier scoping all indexed state (multiple Nim projects
    /// may share one database).
    #[arg(long, global = true, default_value = "default")]
    project_id: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema (idempotent)
    Init,

    /// Index every source file in a Nim project
    Index {
        /// Root directory of the Nim project
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        /// Progress output: human, json, or off (default: human on a TTY)
        #[arg(long)]
        progress: Option<String>,
    },

    /// Re-index changed files and their reverse dependents. With no files
    /// given, every source file's mtime is compared against the last
    /// recorded index to auto-detect what changed.
    UpdateIndex {
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        /// Files that changed, relative to the project root. Omit to
        /// auto-detect via mtime comparison.
        files: Vec<String>,

        /// Follow the dependency graph to a fixpoint instead of one hop
        #[arg(long)]
        transitive: bool,
    },

    /// Search indexed symbols by substring match on name
    Search {
        query: String,

        #[arg(long, default_value_t = 25)]
        limit: i64,
    },

    /// Retrieve full information for a symbol by exact name
    Info { name: String },

    /// Search symbols by embedding similarity
    SemanticSearch {
        query: String,

        #[arg(long, default_value = "combined")]
        vector_kind: String,

        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Report symbol/module/dependency and embedding-coverage statistics
    Stats,

    /// Type-check a file and print compiler diagnostics
    Check {
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        file: String,
    },

    /// Start the MCP HTTP server
    Serve,

    /// Print shell completion scripts for this CLI
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut <Cli as clap::CommandFactory>::command(), "nimgenie", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    let project_id = cli.project_id.as_str();

    match cli.command {
        Commands::Completions { .. } => unreachable!("handled above"),
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }

        Commands::Index { project_root, progress } => {
            let mode = match progress.as_deref() {
                Some("human") => ProgressMode::Human,
                Some("json") => ProgressMode::Json,
                Some("off") => ProgressMode::Off,
                Some(other) => anyhow::bail!("unknown --progress mode: {other}"),
                None => ProgressMode::default_for_tty(),
            };
            let reporter = mode.reporter();

            // Ctrl-C cancels cleanly after the file in flight finishes,
            // rather than killing the process mid-write (spec §5).
            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_for_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel_for_signal.cancel();
                }
            });

            let (toolchain, store, embedding) = open_core(&cfg).await?;
            let indexer = Indexer::with_config(
                &toolchain,
                &store,
                embedding.as_ref(),
                cfg.embedding.dims,
                cfg.indexing.enable_dependency_tracking,
            );
            let outcome = indexer
                .index_project_with_progress(project_id, &project_root, Some(reporter.as_ref()), Some(&cancel))
                .await?;
            if outcome.cancelled {
                println!(
                    "Indexing cancelled: Files processed: {}/{}, Total symbols indexed: {}, Failures: {}",
                    outcome.processed, outcome.total, outcome.symbols, outcome.failures
                );
            } else {
                println!("Files processed: {}/{}", outcome.processed, outcome.total);
                println!("Total symbols indexed: {}", outcome.symbols);
                println!("Failures: {}", outcome.failures);
            }
        }

        Commands::UpdateIndex { project_root, files, transitive } => {
            let (toolchain, store, embedding) = open_core(&cfg).await?;
            let indexer = Indexer::with_config(
                &toolchain,
                &store,
                embedding.as_ref(),
                cfg.embedding.dims,
                cfg.indexing.enable_dependency_tracking,
            );
            let transitive = transitive || cfg.retrieval.dependency_closure == "transitive";
            let explicit = if files.is_empty() { None } else { Some(files.as_slice()) };
            let count = indexer.update_index(project_id, &project_root, explicit, transitive).await?;
            println!("Re-indexed {count} symbols");
        }

        Commands::Search { query, limit } => {
            let pool = db::connect(&cfg).await?;
            let store = SymbolStore::with_dims(pool, cfg.embedding.dims);
            let hits = store.search_symbols(project_id, &query, limit).await;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }

        Commands::Info { name } => {
            let pool = db::connect(&cfg).await?;
            let store = SymbolStore::with_dims(pool, cfg.embedding.dims);
            let info = store.get_symbol_info(project_id, &name).await;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::SemanticSearch { query, vector_kind, limit } => {
            let (_toolchain, store, embedding) = open_core(&cfg).await?;
            let embedding = embedding
                .ok_or_else(|| anyhow::anyhow!("embedding.enabled must be true in config to semantic-search"))?;

            let probe = models::SymbolRecord {
                project_id: project_id.to_string(),
                name: query.clone(),
                kind: String::new(),
                module: String::new(),
                file_path: String::new(),
                line: 0,
                col: 0,
                signature: None,
                documentation: Some(query.clone()),
                exported: true,
                deprecated: false,
                created: chrono::Utc::now(),
            };
            let vectors = embedding.embed_symbol(&probe, cfg.embedding.dims).await;
            let query_vector = vectors
                .combined
                .or(vectors.documentation)
                .ok_or_else(|| anyhow::anyhow!("embedding service did not return a usable vector"))?;

            let hits = store
                .semantic_search_symbols(project_id, &query_vector, &vector_kind, limit)
                .await;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }

        Commands::Stats => {
            stats::run_stats(&cfg, project_id).await?;
        }

        Commands::Check { project_root, file } => {
            let toolchain = ToolchainDriver::new(&cfg.toolchain);
            let result = toolchain.check(&project_root, &file).await?;
            print!("{}", result.output);
            if result.status != "success" {
                std::process::exit(result.exit_code.max(1));
            }
        }

        Commands::Serve => {
            let (toolchain, store, embedding) = open_core(&cfg).await?;
            let ctx = traits::ToolContext {
                coordinator: Arc::new(coordinator::Coordinator::new(Arc::new(cfg.clone()))),
                store: Arc::new(store),
                toolchain: Arc::new(toolchain),
                embedding: embedding.map(Arc::new),
            };
            server::run_server(cfg, ctx).await?;
        }
    }

    Ok(())
}

/// Opens the pieces common to most subcommands: the DB-backed store, the
/// Nim toolchain driver, and (if `embedding.enabled`) the embedding client.
async fn open_core(cfg: &Config) -> anyhow::Result<(ToolchainDriver, SymbolStore, Option<EmbeddingClient>)> {
    let pool = db::connect(cfg).await?;
    let store = SymbolStore::with_dims(pool, cfg.embedding.dims);
    let toolchain = ToolchainDriver::new(&cfg.toolchain);
    let embedding = if cfg.embedding.is_enabled() {
        let client = EmbeddingClient::new(&cfg.embedding)?;
        if client.is_available().await {
            Some(client)
        } else if let Err(err) = client.ensure_model().await {
            tracing::warn!(error = %err, "embedding service is unreachable and the model could not be pulled; continuing without embeddings");
            None
        } else if client.is_available().await {
            Some(client)
        } else {
            tracing::warn!("embedding service still unavailable after pulling the model; continuing without embeddings");
            None
        }
    } else {
        None
    };
    Ok((toolchain, store, embedding))
}
