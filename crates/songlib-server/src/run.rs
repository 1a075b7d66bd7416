use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use songlib_app::music_info::MusicInfoClient;
use songlib_app::rest_api::api_router;
use songlib_app::state::{AppConfig, AppState};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = TcpListener::bind(&addr).await?;
    run_graceful_with_listener(&args, state, listener, shutdown_signal).await
}

/// Serves on already bound listener, so callers can use ephemeral port
pub async fn run_graceful_with_listener<S>(
    args: &ServerConfig,
    state: AppState,
    listener: TcpListener,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let app = main_router(args, state);
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(info(title = "Songlib API", description = "Song catalog with lyrics verses"))]
    struct OpenApi;

    use utoipa::OpenApi as _;
    OpenApi::openapi().nest("/api/v1", songlib_app::rest_api::api_docs())
}

pub fn main_router(args: &ServerConfig, state: AppState) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api/v1", api_router())
        .with_state(state)
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }

    let mut router = router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            args.request_timeout,
        ))
        .layer(TraceLayer::new_for_http());

    if args.cors() {
        router = router.layer(CorsLayer::very_permissive());
    }
    router
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    // Its OK here to block, as it's short and called only on init
    let data_dir = config.backend.ensure_data_dir()?;
    debug!("Using data directory {}", data_dir.display());

    let pool = songlib_dal::new_pool(&config.database_url()).await?;
    songlib_dal::migrate(&pool).await?;

    let music_info = MusicInfoClient::new(&config.music_info_url, config.lookup_timeout)?;
    info!("Music info service at {}", music_info.info_url());

    let app_config = AppConfig {
        paging: config.paging_defaults(),
    };
    Ok(AppState::new(app_config, pool, music_info))
}
