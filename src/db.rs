//! MySQL-wire-compatible connection pool.
//!
//! Any DBMS that speaks the MySQL wire protocol and supports native
//! `VECTOR(D)` columns plus `vecCosineDistance()` is acceptable here — the
//! pool itself only needs a standard `mysql://` URL.

use anyhow::Result;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db.max_connections)
        .connect(&config.db.url)
        .await?;

    Ok(pool)
}
