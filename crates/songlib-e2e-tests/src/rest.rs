use anyhow::Result;
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use tracing::info;

pub fn api_url(base_url: &Url, path: &str) -> Url {
    let url = format!("{}api/v1/{}", base_url, path.trim_start_matches('/'));
    Url::parse(&url).unwrap()
}

async fn json_body(response: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

pub async fn create_song(
    client: &reqwest::Client,
    base_url: &Url,
    group: &str,
    song: &str,
) -> Result<(StatusCode, Value)> {
    let payload = json!({"group": group, "song": song});
    let response = client
        .post(api_url(base_url, "songs"))
        .json(&payload)
        .send()
        .await?;
    info!("Create response: {:?}", response.status());
    json_body(response).await
}

pub async fn list_songs(
    client: &reqwest::Client,
    base_url: &Url,
    query: &[(&str, &str)],
) -> Result<(StatusCode, Value)> {
    let response = client
        .get(api_url(base_url, "songs"))
        .query(query)
        .send()
        .await?;
    json_body(response).await
}

pub async fn song_text(
    client: &reqwest::Client,
    base_url: &Url,
    id: &str,
    query: &[(&str, &str)],
) -> Result<(StatusCode, Value)> {
    let response = client
        .get(api_url(base_url, &format!("songs/{id}/text")))
        .query(query)
        .send()
        .await?;
    json_body(response).await
}

pub async fn update_song(
    client: &reqwest::Client,
    base_url: &Url,
    id: &str,
    payload: &Value,
) -> Result<(StatusCode, Value)> {
    let response = client
        .patch(api_url(base_url, &format!("songs/{id}")))
        .json(payload)
        .send()
        .await?;
    json_body(response).await
}

pub async fn delete_song(client: &reqwest::Client, base_url: &Url, id: &str) -> Result<StatusCode> {
    let response = client
        .delete(api_url(base_url, &format!("songs/{id}")))
        .send()
        .await?;
    Ok(response.status())
}
