use std::time::Duration;

use crate::error::Result;
pub use clap::Parser;
use songlib_dal::PagingDefaults;
use songlib_types::config::BackendConfig;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Song catalog server")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "SONGLIB_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "SONGLIB_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "SONGLIB_MUSIC_INFO_URL",
        help = "Base URL of music info service, song details are looked up at [url]/info"
    )]
    pub music_info_url: Url,

    #[arg(
        long,
        env = "SONGLIB_LOOKUP_TIMEOUT",
        default_value = "10s",
        help = "Timeout of music info lookup in human friendly format (e.g. 10s, 1m)",
        value_parser = humantime::parse_duration
    )]
    pub lookup_timeout: Duration,

    #[arg(
        long,
        env = "SONGLIB_REQUEST_TIMEOUT",
        default_value = "30s",
        help = "Deadline for handling of one request in human friendly format",
        value_parser = humantime::parse_duration
    )]
    pub request_timeout: Duration,

    #[arg(
        long,
        env = "SONGLIB_DEFAULT_OFFSET",
        default_value_t = 0,
        help = "Offset used when request does not specify one"
    )]
    pub default_offset: u64,

    #[arg(
        long,
        env = "SONGLIB_DEFAULT_LIMIT",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Page size used when request does not specify one"
    )]
    pub default_limit: u64,

    #[arg(long, env = "SONGLIB_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }

    pub fn paging_defaults(&self) -> PagingDefaults {
        PagingDefaults::new(self.default_offset, self.default_limit)
    }

    pub fn cors(&self) -> bool {
        !self.no_cors
    }
}
