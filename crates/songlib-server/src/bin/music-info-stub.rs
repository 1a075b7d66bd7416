use clap::Parser;
use songlib_server::{stub, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Stand-in for external music info service, answers any lookup with fixed details
#[derive(Debug, Parser)]
#[command(version, about)]
struct StubConfig {
    #[arg(short, long, default_value_t = 8081, env = "MUSIC_INFO_STUB_PORT")]
    port: u16,
    #[arg(short, long, default_value = "127.0.0.1", env = "MUSIC_INFO_STUB_ADDRESS")]
    listen_address: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = StubConfig::parse();
    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let listener = TcpListener::bind((ip, args.port)).await?;
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
    };
    stub::serve(listener, shutdown).await
}
