//! Database schema migrations.
//!
//! Creates all required tables (symbols, modules, file_dependencies,
//! file_modifications, embedding_metadata, registered_directories) and
//! ensures idempotent execution. Run via `nimgenie init`.
//!
//! The four embedding vector columns on `symbols` (documentation, signature,
//! name, combined) use the DBMS's native `VECTOR(D)` type so similarity
//! search can run in SQL via `vecCosineDistance()` instead of a brute-force
//! scan over BLOBs.

use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let dims = config.embedding.dims.unwrap_or(768);

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS modules (
            project_id VARCHAR(64) NOT NULL,
            name VARCHAR(255) NOT NULL,
            file_path VARCHAR(1024) NOT NULL,
            documentation TEXT,
            last_modified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (project_id, name)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    let create_symbols = format!(
        r#"
        CREATE TABLE IF NOT EXISTS symbols (
            id BIGINT AUTO_INCREMENT PRIMARY KEY,
            project_id VARCHAR(64) NOT NULL,
            name VARCHAR(255) NOT NULL,
            kind VARCHAR(32) NOT NULL,
            module VARCHAR(255) NOT NULL,
            file_path VARCHAR(1024) NOT NULL,
            line BIGINT NOT NULL,
            col BIGINT NOT NULL,
            signature TEXT,
            documentation TEXT,
            exported BOOLEAN NOT NULL DEFAULT TRUE,
            deprecated BOOLEAN NOT NULL DEFAULT FALSE,
            created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            doc_vector VECTOR({dims}),
            signature_vector VECTOR({dims}),
            name_vector VECTOR({dims}),
            combined_vector VECTOR({dims})
        )
        "#,
        dims = dims
    );
    sqlx::query(&create_symbols).execute(&pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_dependencies (
            project_id VARCHAR(64) NOT NULL,
            source_file VARCHAR(1024) NOT NULL,
            target_file VARCHAR(1024) NOT NULL,
            created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (project_id, source_file, target_file)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_modifications (
            project_id VARCHAR(64) NOT NULL,
            file_path VARCHAR(1024) NOT NULL,
            content_hash VARCHAR(64) NOT NULL,
            modified_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (project_id, file_path)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS embedding_metadata (
            project_id VARCHAR(64) NOT NULL,
            embedding_type VARCHAR(32) NOT NULL,
            model VARCHAR(255) NOT NULL,
            dims BIGINT NOT NULL,
            total_symbols BIGINT NOT NULL DEFAULT 0,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (project_id, embedding_type)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS registered_directories (
            project_id VARCHAR(64) NOT NULL,
            alias VARCHAR(255) NOT NULL,
            path VARCHAR(1024) NOT NULL,
            description TEXT,
            created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (project_id, alias)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Prefix indexes: name/module columns can exceed typical key-length
    // limits, so index only the leading bytes (mirrors the teacher's
    // composite-index approach in migrate.rs, adapted for VARCHAR prefixing).
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_symbols_project_name ON symbols(project_id, name(191))")
        .execute(&pool)
        .await
        .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_symbols_project_module ON symbols(project_id, module(191))")
        .execute(&pool)
        .await
        .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_symbols_project_file ON symbols(project_id, file_path(191))")
        .execute(&pool)
        .await
        .ok();
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_file_dependencies_target ON file_dependencies(project_id, target_file(191))",
    )
    .execute(&pool)
    .await
    .ok();
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_modifications_modified_at ON file_modifications(modified_at)")
        .execute(&pool)
        .await
        .ok();

    pool.close().await;
    Ok(())
}
