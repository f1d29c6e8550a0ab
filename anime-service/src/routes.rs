//! Routing table

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers::anime,
    health::{health, readiness},
    middleware::AccessControl,
    repository::AnimeRepository,
    state::AppState,
};

/// Build the application router
///
/// Access control wraps every route and the fallback. Error bodies are
/// completed by [`crate::middleware::error_formatter`], which
/// [`crate::server::Server::apply_layers`] mounts around the whole stack.
pub fn router<R: AnimeRepository>(state: AppState<R>) -> Router {
    let access = state.access().clone();

    let app = Router::new()
        .route("/health", get(health::<R>))
        .route("/ready", get(readiness::<R>))
        .route("/animes", get(anime::list_all::<R>).post(anime::save::<R>))
        .route("/animes/batch", post(anime::save_batch::<R>))
        .route(
            "/animes/{id}",
            get(anime::find_by_id::<R>)
                .put(anime::update::<R>)
                .delete(anime::delete::<R>),
        );

    #[cfg(feature = "openapi")]
    let app = app.merge(crate::openapi::docs_router());

    app.layer(middleware::from_fn_with_state(access, AccessControl::middleware))
        .with_state(state)
}
