use axum::routing::get;

use crate::state::AppState;

pub mod paging;
pub mod song;

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/ping", tag = "Health",
    operation_id = "ping",
    responses((status = 200, description = "Service is up", body = String))))]
async fn ping() -> &'static str {
    "pong"
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(ping))]
struct ApiDocs;

/// Docs of [`api_router`] routes, with paths relative to its mount point
#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ApiDocs::openapi().nest("/songs", song::api_docs())
}

/// Routes of the versioned API, to be nested under `/api/v1`
pub fn api_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/ping", get(ping))
        .nest("/songs", song::router())
}
