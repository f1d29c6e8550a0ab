//! OpenAPI document and Swagger UI
//!
//! Enabled by the `openapi` feature. The document is served at
//! [`OPENAPI_JSON_PATH`] and the UI under [`SWAGGER_UI_PATH`]; both are public
//! in [`crate::security::AccessPolicy::anime_defaults`].

use axum::{response::Redirect, routing::get, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{error::ErrorBody, handlers::anime, model::Anime};

/// Name of the Basic security scheme referenced by every operation
pub const BASIC_AUTH_SCHEME: &str = "Basic Authentication";

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/v3/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "anime-service", description = "CRUD API for anime records"),
    paths(
        anime::list_all,
        anime::find_by_id,
        anime::save,
        anime::save_batch,
        anime::update,
        anime::delete,
    ),
    components(schemas(Anime, ErrorBody)),
    modifiers(&BasicAuth),
    tags((name = "anime", description = "Anime records"))
)]
pub struct ApiDoc;

struct BasicAuth;

impl Modify for BasicAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(BASIC_AUTH_SCHEME, basic_auth());
    }
}

/// HTTP Basic security scheme
pub fn basic_auth() -> SecurityScheme {
    SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build())
}

/// Routes serving the document, the UI and the legacy `/swagger-ui.html` entry point
pub fn docs_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let ui: Router<S> = SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into();

    ui.route(
        "/swagger-ui.html",
        get(|| async { Redirect::permanent("/swagger-ui/") }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn document() -> Value {
        serde_json::to_value(ApiDoc::openapi()).unwrap()
    }

    #[test]
    fn test_every_anime_route_documented() {
        let doc = document();
        let paths = &doc["paths"];

        assert!(paths["/animes"]["get"].is_object());
        assert!(paths["/animes"]["post"].is_object());
        assert!(paths["/animes/batch"]["post"].is_object());
        assert!(paths["/animes/{id}"]["get"].is_object());
        assert!(paths["/animes/{id}"]["put"].is_object());
        assert!(paths["/animes/{id}"]["delete"].is_object());
        assert_eq!(paths["/animes"]["get"]["tags"][0], "anime");
    }

    #[test]
    fn test_operations_require_basic_auth() {
        let doc = document();

        let scheme = &doc["components"]["securitySchemes"][BASIC_AUTH_SCHEME];
        assert_eq!(scheme["type"], "http");
        assert_eq!(scheme["scheme"], "basic");

        let security = &doc["paths"]["/animes/{id}"]["delete"]["security"][0];
        assert!(security.get(BASIC_AUTH_SCHEME).is_some());
    }

    #[test]
    fn test_schemas_registered() {
        let doc = document();
        let schemas = &doc["components"]["schemas"];

        assert!(schemas["Anime"]["properties"]["name"].is_object());
        assert!(schemas["ErrorBody"]["properties"]["developmentMessage"].is_object());
    }
}
