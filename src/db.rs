// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

use crate::config::StoreConfig;
use crate::error::StoreResult;

/// Connects to Postgres and brings the schema up to date.
pub async fn create_pool(database_url: &str, config: &StoreConfig) -> StoreResult<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.timeout)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
