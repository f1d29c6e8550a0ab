//! `/animes` request handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use futures::TryStreamExt;

use crate::{
    error::{Error, Result},
    model::Anime,
    repository::AnimeRepository,
    responses::{Created, NoContent},
    state::AppState,
};

/// Message of the 400 raised when a single-item request has an empty name
pub const NAME_REQUIRED: &str = "The anime name cannot be empty";

fn path_id(id: std::result::Result<Path<i32>, PathRejection>) -> Result<i32> {
    id.map(|Path(id)| id)
        .map_err(|rejection| Error::BadRequest(rejection.body_text()))
}

/// Unreadable JSON is a 400; other rejections keep axum's status (413, 415)
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value).map_err(|rejection| match rejection {
        JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
            Error::BadRequest(rejection.body_text())
        }
        other => Error::Rejected {
            status: other.status(),
            message: other.body_text(),
        },
    })
}

fn validate(anime: &Anime) -> Result<()> {
    if anime.has_name() {
        Ok(())
    } else {
        Err(Error::BadRequest(NAME_REQUIRED.to_string()))
    }
}

/// `GET /animes`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/animes",
    tag = "anime",
    summary = "List all animes",
    security(("Basic Authentication" = [])),
    responses(
        (status = 200, description = "Every stored anime", body = Vec<Anime>),
        (status = 401, description = "Missing or bad credentials", body = crate::error::ErrorBody),
    )
))]
pub async fn list_all<R: AnimeRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Anime>>> {
    let animes: Vec<Anime> = state.animes().find_all().try_collect().await?;
    Ok(Json(animes))
}

/// `GET /animes/{id}`
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/animes/{id}",
    tag = "anime",
    summary = "Find anime by id",
    params(("id" = i32, Path, description = "Anime id")),
    security(("Basic Authentication" = [])),
    responses(
        (status = 200, description = "The anime", body = Anime),
        (status = 404, description = "No anime with this id", body = crate::error::ErrorBody),
    )
))]
pub async fn find_by_id<R: AnimeRepository>(
    State(state): State<AppState<R>>,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Anime>> {
    let id = path_id(id)?;
    Ok(Json(state.animes().find_by_id(id).await?))
}

/// `POST /animes`
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/animes",
    tag = "anime",
    summary = "Save anime",
    request_body = Anime,
    security(("Basic Authentication" = [])),
    responses(
        (status = 201, description = "The stored anime", body = Anime),
        (status = 400, description = "Empty name or unreadable body", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ErrorBody),
    )
))]
pub async fn save<R: AnimeRepository>(
    State(state): State<AppState<R>>,
    body: std::result::Result<Json<Anime>, JsonRejection>,
) -> Result<Created<Anime>> {
    let anime = json_body(body)?;
    validate(&anime)?;

    let saved = state.animes().save(anime).await?;
    let created = match saved.id {
        Some(id) => Created::new(saved).with_location(format!("/animes/{}", id)),
        None => Created::new(saved),
    };
    Ok(created)
}

/// `POST /animes/batch`
///
/// Items are validated by the service after they are stored.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/animes/batch",
    tag = "anime",
    summary = "Save batch",
    request_body = Vec<Anime>,
    security(("Basic Authentication" = [])),
    responses(
        (status = 201, description = "The stored animes", body = Vec<Anime>),
        (status = 400, description = "A stored anime has an empty name", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ErrorBody),
    )
))]
pub async fn save_batch<R: AnimeRepository>(
    State(state): State<AppState<R>>,
    body: std::result::Result<Json<Vec<Anime>>, JsonRejection>,
) -> Result<Created<Vec<Anime>>> {
    let animes = json_body(body)?;
    let saved: Vec<Anime> = state.animes().save_all(animes).try_collect().await?;
    Ok(Created::new(saved))
}

/// `PUT /animes/{id}`
///
/// The path id replaces any id in the body.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/animes/{id}",
    tag = "anime",
    summary = "Update anime",
    params(("id" = i32, Path, description = "Anime id")),
    request_body = Anime,
    security(("Basic Authentication" = [])),
    responses(
        (status = 204, description = "Anime replaced"),
        (status = 404, description = "No anime with this id", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ErrorBody),
    )
))]
pub async fn update<R: AnimeRepository>(
    State(state): State<AppState<R>>,
    id: std::result::Result<Path<i32>, PathRejection>,
    body: std::result::Result<Json<Anime>, JsonRejection>,
) -> Result<NoContent> {
    let id = path_id(id)?;
    let mut anime = json_body(body)?;
    validate(&anime)?;

    anime.id = Some(id);
    state.animes().update(anime).await?;
    Ok(NoContent)
}

/// `DELETE /animes/{id}`
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/animes/{id}",
    tag = "anime",
    summary = "Delete anime",
    params(("id" = i32, Path, description = "Anime id")),
    security(("Basic Authentication" = [])),
    responses(
        (status = 204, description = "Anime deleted"),
        (status = 404, description = "No anime with this id", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not ADMIN", body = crate::error::ErrorBody),
    )
))]
pub async fn delete<R: AnimeRepository>(
    State(state): State<AppState<R>>,
    id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<NoContent> {
    let id = path_id(id)?;
    state.animes().delete(id).await?;
    Ok(NoContent)
}
