//! PostgreSQL connection pool and schema

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::DatabaseConfig, error::{Error, Result}};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

const CREATE_ANIME: &str = "CREATE TABLE IF NOT EXISTS anime (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL
)";

const CREATE_USER_SYSTEM: &str = "CREATE TABLE IF NOT EXISTS user_system (
    id SERIAL PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    authorities VARCHAR(255) NOT NULL DEFAULT ''
)";

/// Create a PostgreSQL connection pool
///
/// Retries with exponential backoff up to `max_retries` times.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                tracing::info!(
                    attempts = attempt + 1,
                    max = config.max_connections,
                    min = config.min_connections,
                    "Database connection pool created"
                );
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before retry `attempt` (1-based), doubling each time up to [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

async fn try_create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| {
            Error::Internal(format!(
                "Failed to connect to database at '{}': {} ({})",
                sanitize_connection_url(&config.url),
                categorize_db_error(&e),
                e
            ))
        })
}

/// Create the `anime` and `user_system` tables if missing
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in [CREATE_ANIME, CREATE_USER_SYSTEM] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| Error::Internal(format!("Failed to prepare schema: {}", e)))?;
    }
    tracing::debug!("Database schema ready");
    Ok(())
}

/// Mask the password of a connection URL for logging
fn sanitize_connection_url(url: &str) -> String {
    let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) else {
        return url.to_string();
    };
    if at_pos < scheme_end + 3 {
        return url.to_string();
    }
    let credentials = &url[scheme_end + 3..at_pos];
    match credentials.split_once(':') {
        Some((username, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], username, &url[at_pos..]),
        None => url.to_string(),
    }
}

fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::Configuration(_) => "configuration error",
        sqlx::Error::Database(_) => "database rejected the connection",
        sqlx::Error::Io(_) => "network I/O error",
        sqlx::Error::Tls(_) => "TLS error",
        sqlx::Error::PoolTimedOut => "connection pool timeout",
        sqlx::Error::PoolClosed => "connection pool closed",
        _ => "connection error",
    }
}
