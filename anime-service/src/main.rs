use anime_service::prelude::*;
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config).context("failed to initialize tracing")?;

    #[cfg(feature = "database")]
    if let Some(database) = config.database.clone() {
        return serve_postgres(config, &database).await;
    }

    tracing::warn!("No database configured, anime records are kept in memory");
    let state = AppState::builder()
        .config(config.clone())
        .repository(InMemoryAnimeRepository::new())
        .build()
        .context("failed to build application state")?;

    Server::new(config)
        .serve(router(state))
        .await
        .context("server error")
}

#[cfg(feature = "database")]
async fn serve_postgres(
    config: Config,
    database: &anime_service::config::DatabaseConfig,
) -> anyhow::Result<()> {
    use std::sync::Arc;

    use anime_service::database::{create_pool, ensure_schema};
    use anime_service::security::{ChainedUserDirectory, InMemoryUserDirectory, PgUserDirectory};

    let pool = create_pool(database)
        .await
        .context("failed to connect to database")?;
    ensure_schema(&pool)
        .await
        .context("failed to prepare database schema")?;

    let users = ChainedUserDirectory::new()
        .with(Arc::new(PgUserDirectory::new(pool.clone())))
        .with(Arc::new(InMemoryUserDirectory::new(
            config.security.users.clone(),
        )));

    let state = AppState::builder()
        .config(config.clone())
        .repository(PgAnimeRepository::new(pool))
        .users(Arc::new(users))
        .build()
        .context("failed to build application state")?;

    Server::new(config)
        .serve(router(state))
        .await
        .context("server error")
}
