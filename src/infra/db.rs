//! Postgres pool bootstrap.

use crate::infra::config::AppConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Makes up to `db_connect_retries` attempts, sleeping
/// `db_connect_retry_delay` between them.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                info!(attempt, max_connections = config.db_max_connections, "Connected to Postgres");
                return Ok(pool);
            }
            Err(e) if attempt < config.db_connect_retries.max(1) => {
                warn!(
                    attempt,
                    retries = config.db_connect_retries,
                    error = %e,
                    "Postgres connection failed, retrying in {:?}",
                    config.db_connect_retry_delay
                );
                tokio::time::sleep(config.db_connect_retry_delay).await;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("could not connect to Postgres after {attempt} attempts")));
            }
        }
    }
}
