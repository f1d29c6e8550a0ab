//! # anime-service
//!
//! A CRUD HTTP API for anime records, protected by HTTP Basic authentication
//! with a USER/ADMIN role policy.
//!
//! ## Layout
//!
//! - [`repository`]: the record store abstraction, with in-memory and PostgreSQL stores
//! - [`service`]: existence checks, not-found translation and batch validation
//! - [`handlers`] and [`routes`]: the HTTP surface
//! - [`security`] and [`middleware`]: authentication, authorization and error bodies
//! - `openapi`: OpenAPI document and Swagger UI (requires the `openapi` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use anime_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder()
//!         .config(config.clone())
//!         .repository(InMemoryAnimeRepository::new())
//!         .build()?;
//!
//!     Server::new(config).serve(router(state)).await
//! }
//! ```

pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod model;
pub mod observability;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod repository;
pub mod responses;
pub mod routes;
pub mod security;
pub mod server;
pub mod service;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::model::Anime;
    pub use crate::observability::init_tracing;
    pub use crate::repository::{AnimeRepository, InMemoryAnimeRepository};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::service::AnimeService;
    pub use crate::state::AppState;

    #[cfg(feature = "database")]
    pub use crate::repository::PgAnimeRepository;
}
