use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shared_config::AppConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Shared application state handed to every router. The pool is cheap to
/// clone; each cell's service borrows it per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: PgPool,
}

pub async fn create_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    info!("Database pool established");
    Ok(pool)
}
