use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use songlib_dal::song::SongDetail;
use songlib_types::DayMonthYear;
use tracing::debug;
use url::Url;

use crate::catalog::MetadataLookup;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response status: {0}")]
    Status(StatusCode),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SongInfo {
    release_date: String,
    text: String,
    link: String,
}

impl TryFrom<SongInfo> for SongDetail {
    type Error = LookupError;

    fn try_from(info: SongInfo) -> Result<Self, Self::Error> {
        for (name, value) in [
            ("releaseDate", &info.release_date),
            ("text", &info.text),
            ("link", &info.link),
        ] {
            if value.trim().is_empty() {
                return Err(LookupError::InvalidResponse(format!("empty {name}")));
            }
        }
        let release_date: DayMonthYear = info
            .release_date
            .parse()
            .map_err(|e| LookupError::InvalidResponse(format!("{e}")))?;
        Ok(SongDetail {
            release_date: Some(release_date.into()),
            text: Some(info.text),
            link: Some(info.link),
        })
    }
}

/// Client of music info service, `GET {base}/info?group=..&song=..`
#[derive(Debug, Clone)]
pub struct MusicInfoClient {
    http_client: reqwest::Client,
    info_url: Url,
}

impl MusicInfoClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, LookupError> {
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let info_url = base_url.join("info")?;
        let http_client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http_client,
            info_url,
        })
    }

    pub fn info_url(&self) -> &Url {
        &self.info_url
    }

    pub async fn song_info(&self, group: &str, title: &str) -> Result<SongDetail, LookupError> {
        debug!("Looking up {group} - {title} at {}", self.info_url);
        let response = self
            .http_client
            .get(self.info_url.clone())
            .query(&[("group", group), ("song", title)])
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(LookupError::Status(response.status()));
        }
        let body = response.bytes().await?;
        let info: SongInfo = serde_json::from_slice(&body)
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;
        info.try_into()
    }
}

impl MetadataLookup for MusicInfoClient {
    async fn lookup(&self, group: &str, title: &str) -> Result<SongDetail, LookupError> {
        self.song_info(group, title).await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn info(release_date: &str, text: &str, link: &str) -> SongInfo {
        SongInfo {
            release_date: release_date.into(),
            text: text.into(),
            link: link.into(),
        }
    }

    #[test]
    fn test_info_url() {
        let timeout = Duration::from_secs(1);
        for base in ["http://localhost:8080", "http://localhost:8080/"] {
            let client = MusicInfoClient::new(&base.parse().unwrap(), timeout).unwrap();
            assert_eq!(client.info_url().as_str(), "http://localhost:8080/info");
        }
        let client =
            MusicInfoClient::new(&"http://localhost/music".parse().unwrap(), timeout).unwrap();
        assert_eq!(client.info_url().as_str(), "http://localhost/music/info");
    }

    #[test]
    fn test_song_info_conversion() {
        let detail =
            SongDetail::try_from(info("26.08.1968", "Hey Jude", "https://example.com")).unwrap();
        assert_eq!(detail.release_date, Some(date!(1968 - 08 - 26)));
        assert_eq!(detail.text.as_deref(), Some("Hey Jude"));

        assert!(SongDetail::try_from(info("1968-08-26", "Hey Jude", "https://x.y")).is_err());
        assert!(SongDetail::try_from(info("26.08.1968", "", "https://x.y")).is_err());
        assert!(SongDetail::try_from(info("26.08.1968", "Hey Jude", " ")).is_err());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let res = serde_json::from_str::<SongInfo>(r#"{"releaseDate":"26.08.1968","text":"x"}"#);
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        // nothing listens on port 1
        let client = MusicInfoClient::new(
            &"http://127.0.0.1:1".parse().unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.song_info("Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, LookupError::Http(_)));
    }
}
