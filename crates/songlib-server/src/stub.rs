//! Minimal music info service for local runs and end-to-end tests.
//!
//! Whatever song is asked for, the answer is always the same.

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::Result;

pub const STUB_RELEASE_DATE: &str = "16.07.2006";
pub const STUB_TEXT: &str = "Ooh baby, don't you know I suffer?\nOoh baby, can you hear me moan?\n\
    You caught me under false pretenses\nHow long before you let me go?\n\n\
    Ooh\nYou set my soul alight\nOoh\nYou set my soul alight";
pub const STUB_LINK: &str = "https://www.youtube.com/watch?v=Xsp3_a-PMTw";

#[derive(Debug, Deserialize)]
struct InfoQuery {
    group: Option<String>,
    song: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    release_date: &'static str,
    text: &'static str,
    link: &'static str,
}

async fn info(Query(query): Query<InfoQuery>) -> impl IntoResponse {
    let group = query.group.unwrap_or_default();
    let song = query.song.unwrap_or_default();
    if group.is_empty() || song.is_empty() {
        debug!("Rejecting lookup without group or song");
        return (StatusCode::BAD_REQUEST, "group and song are required").into_response();
    }
    debug!("Lookup of {group} - {song}");
    Json(InfoResponse {
        release_date: STUB_RELEASE_DATE,
        text: STUB_TEXT,
        link: STUB_LINK,
    })
    .into_response()
}

pub fn router() -> Router {
    Router::new().route("/info", get(info))
}

pub async fn serve<S>(listener: TcpListener, shutdown_signal: S) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    info!("Music info stub listening on {}", listener.local_addr()?);
    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt as _;
    use serde_json::Value;
    use tower::ServiceExt as _;

    use super::*;

    async fn get_info(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_info() {
        let (status, body) = get_info("/info?group=Muse&song=Supermassive%20Black%20Hole").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["releaseDate"], STUB_RELEASE_DATE);
        assert_eq!(value["link"], STUB_LINK);
        assert!(value["text"].as_str().unwrap().contains("\n\n"));
    }

    #[tokio::test]
    async fn test_info_requires_params() {
        for uri in ["/info", "/info?group=Muse", "/info?group=&song=Uprising"] {
            let (status, _) = get_info(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_serve_with_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, async {
            rx.await.ok();
        }));

        let client = songlib_app::music_info::MusicInfoClient::new(
            &format!("http://{addr}").parse().unwrap(),
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let detail = client.song_info("Muse", "Uprising").await.unwrap();
        assert_eq!(detail.link.as_deref(), Some(STUB_LINK));
        assert_eq!(detail.text.as_deref(), Some(STUB_TEXT));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
