//! `nimgenie stats` CLI entry point.
//!
//! Prints the same project/embedding statistics the `getProjectStats` and
//! `getEmbeddingStats` MCP tools return, formatted for a terminal.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store::SymbolStore;

pub async fn run_stats(config: &Config, project_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SymbolStore::new(pool);

    let project = store.project_stats(project_id).await;
    let embedding = store.embedding_stats(project_id).await;

    println!("NimGenie — Project Stats ({project_id})");
    println!("========================================");
    println!();
    println!("  Symbols:      {}", project["symbolCount"]);
    println!("  Modules:      {}", project["moduleCount"]);
    println!("  Dependencies: {}", project["dependencyCount"]);
    println!();
    println!(
        "  Embedded:     {} / {} ({:.1}%)",
        embedding["embeddedSymbols"], embedding["totalSymbols"], embedding["coveragePercent"]
    );
    println!();

    Ok(())
}
