//! # NimGenie
//!
//! **An MCP server that exposes a Nim workspace — source tree plus Nimble
//! package cache — as tools an AI agent can invoke.**
//!
//! NimGenie drives the `nim` compiler as a subprocess to extract symbol
//! documentation, persists symbols (with four embedding vectors each) in a
//! MySQL-wire-compatible database with native vector columns, and exposes
//! lexical and semantic search, incremental re-indexing, syntax checking,
//! and package discovery over the Model Context Protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐   ┌───────────────┐
//! │ Toolchain  │──▶│ Doc Parser │──▶│  Indexer    │──▶│ Symbol Store  │
//! │ (nim exec) │   │ (pure fns) │   │ (C1→C2→C3→C4)│  │ VECTOR(D) cols│
//! └────────────┘   └────────────┘   └──────┬──────┘   └───────┬───────┘
//!                                          │                  │
//!                    ┌─────────────────────┤     ┌────────────┘
//!                    ▼                     ▼     ▼
//!              ┌───────────┐         ┌──────────────┐
//!              │Coordinator│────────▶│Tool Registry │
//!              │ (1 mutex) │         │  (MCP + CLI) │
//!              └───────────┘         └──────┬───────┘
//!                                           ▼
//!                                    ┌─────────────┐
//!                                    │ axum + rmcp │
//!                                    │  HTTP server│
//!                                    └─────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **toolchain driver** ([`toolchain`]) spawns `nim jsondoc`,
//!    `nim doc --index`, and `nim genDepend` per source file.
//! 2. The **doc parser** ([`docparser`]) turns each of those textual outputs
//!    into [`models::SymbolRecord`]s and dependency edges.
//! 3. The **indexer** ([`indexer`]) orchestrates toolchain → parser →
//!    embedding → store for a whole project, or for an incremental
//!    re-index set computed from the dependency graph.
//! 4. The **embedding client** ([`embedding`]) derives four vectors per
//!    symbol (name, signature, documentation, combined) from a local
//!    Ollama-compatible HTTP service.
//! 5. The **symbol store** ([`store`]) persists everything and answers
//!    lexical (`LIKE`) and semantic (`vecCosineDistance`) queries.
//! 6. The **coordinator** ([`coordinator`]) holds the in-memory project
//!    table, package catalog, and query cache behind one mutex.
//! 7. Tools ([`traits`]) bind MCP tool names to coordinator operations;
//!    [`mcp`] bridges the registry to the `rmcp` protocol types, and
//!    [`server`] serves it all over HTTP alongside static registered
//!    directories ([`dirquery`]).
//!
//! ## Quick Start
//!
//! ```bash
//! nimgenie init                                    # create database schema
//! nimgenie index --project-root .                  # full project index
//! nimgenie search "parseJson"                       # lexical search
//! nimgenie semantic-search "read settings from disk" # vector search
//! nimgenie serve                                    # start the MCP HTTP server
//! ```
//!
//! ## Search Modes
//!
//! | Mode | Engine | Requires Embeddings |
//! |------|--------|---------------------|
//! | lexical | `name LIKE '%query%'` | No |
//! | semantic | `vecCosineDistance` over one of 4 vector columns | Yes |
//! | by-example | semantic search seeded by a code snippet | Yes |
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types: `SymbolRecord`, `Module`, `FileDependency`, ... |
//! | [`toolchain`] | Nim compiler subprocess driver (C1) |
//! | [`docparser`] | Pure parsers for jsondoc/idx/dot output (C2) |
//! | [`embedding`] | Embedding HTTP client + vector utilities (C3) |
//! | [`db`] | MySQL-wire connection pool |
//! | [`migrate`] | Idempotent schema creation |
//! | [`store`] | Symbol persistence and search (C4) |
//! | [`indexer`] | Full and incremental project indexing (C5) |
//! | [`progress`] | Streaming indexing progress events/reporters |
//! | [`packages`] | Nimble package-cache discovery and exec wrapper |
//! | [`dirquery`] | Registered-directory CRUD and static-file serving |
//! | [`dbquery`] | External-database passthrough query tool |
//! | [`coordinator`] | In-memory server state behind one mutex (C6) |
//! | [`traits`] | `Tool` trait, `ToolContext`, `ToolRegistry`, built-in tools (C7) |
//! | [`mcp`] | Bridges `ToolRegistry` to `rmcp`'s MCP protocol types |
//! | [`server`] | Axum HTTP app: MCP endpoint + health + static serving |
//! | [`stats`] | `nimgenie stats` CLI formatting over the store's aggregates |
//!
//! ## Configuration
//!
//! NimGenie is configured via a TOML file (default: `config/nimgenie.toml`).
//! See [`config`] for all available options and [`config::load_config`] for
//! validation rules.

pub mod config;
pub mod coordinator;
pub mod db;
pub mod dbquery;
pub mod dirquery;
pub mod docparser;
pub mod embedding;
pub mod indexer;
pub mod mcp;
pub mod migrate;
pub mod models;
pub mod packages;
pub mod progress;
pub mod server;
pub mod stats;
pub mod store;
pub mod toolchain;
pub mod traits;
