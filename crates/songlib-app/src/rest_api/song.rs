use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use songlib_dal::{
    song::{CreateSong, Song, SongWithVerses, UpdateSong},
    Pagination,
};
use uuid::Uuid;

use super::paging::QueryParams;
#[cfg(feature = "openapi")]
use crate::error::ErrorBody;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    validate::Garde,
};

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SongsPage {
    pub songs: Vec<Song>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VersesPage {
    pub song: SongWithVerses,
    pub pagination: Pagination,
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    raw.parse()
        .map_err(|e| ApiError::InvalidId(format!("{raw}: {e}")))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Songs",
    operation_id = "createSong",
    responses(
        (status = StatusCode::CREATED, description = "Song enriched with music info", body = Song),
        (status = StatusCode::BAD_REQUEST, description = "Invalid payload", body = ErrorBody),
        (status = StatusCode::BAD_GATEWAY, description = "Lookup failed", body = ErrorBody)
    )))]
pub async fn create(
    State(state): State<AppState>,
    Garde(Json(payload)): Garde<Json<CreateSong>>,
) -> ApiResult<impl IntoResponse> {
    let song = state.catalog().add_song(payload).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Songs",
    operation_id = "listSongs",
    params(super::paging::ListParams),
    responses((status = StatusCode::OK, description = "Page of songs", body = SongsPage))))]
pub async fn list(
    State(state): State<AppState>,
    query: QueryParams,
) -> ApiResult<impl IntoResponse> {
    let pagination = query.pagination(state.config().paging);
    let filters = query.filters();
    let batch = state.catalog().fetch_songs(pagination, &filters).await?;
    Ok((
        StatusCode::OK,
        Json(SongsPage {
            songs: batch.rows,
            pagination: batch.pagination,
        }),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{id}/text", tag = "Songs",
    operation_id = "songVerses",
    params(("id" = String, Path, description = "Song UUID"), super::paging::PagingParams),
    responses(
        (status = StatusCode::OK, description = "Page of song verses", body = VersesPage),
        (status = StatusCode::BAD_REQUEST, description = "Invalid song id", body = ErrorBody),
        (status = StatusCode::NOT_FOUND, description = "Song not found", body = ErrorBody)
    )))]
pub async fn verses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: QueryParams,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let pagination = query.pagination(state.config().paging);
    let (song, pagination) = state
        .catalog()
        .fetch_song_with_verses(id, pagination)
        .await?;
    Ok((StatusCode::OK, Json(VersesPage { song, pagination })))
}

#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/{id}", tag = "Songs",
    operation_id = "updateSong",
    params(("id" = String, Path, description = "Song UUID")),
    responses(
        (status = StatusCode::OK, description = "Updated song", body = Song),
        (status = StatusCode::BAD_REQUEST, description = "Nothing to update", body = ErrorBody),
        (status = StatusCode::NOT_FOUND, description = "Song not found", body = ErrorBody)
    )))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Garde(Json(payload)): Garde<Json<UpdateSong>>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let song = state.catalog().modify_song(id, payload).await?;
    Ok((StatusCode::OK, Json(song)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{id}", tag = "Songs",
    operation_id = "deleteSong",
    params(("id" = String, Path, description = "Song UUID")),
    responses(
        (status = StatusCode::NO_CONTENT, description = "Song removed"),
        (status = StatusCode::NOT_FOUND, description = "Song not found", body = ErrorBody)
    )))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.catalog().remove_song(id).await?;
    Ok((StatusCode::NO_CONTENT, ()))
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(create, list, verses, update, delete))]
struct SongDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    SongDocs::openapi()
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", axum::routing::patch(update).delete(delete))
        .route("/{id}/text", get(verses))
}
