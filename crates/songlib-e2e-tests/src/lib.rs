pub mod rest;

use anyhow::{Result, anyhow};
use rand::Rng as _;
use songlib_server::config::{Parser, ServerConfig};
use songlib_server::run::run_graceful_with_listener;
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{error, info};
use url::Url;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

/// Keeps test data and the music info stub alive, dropping it cleans up
pub struct EnvGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
    #[allow(dead_code)]
    stub_shutdown: oneshot::Sender<()>,
}

/// Starts music info stub on ephemeral port, it stops when returned sender is dropped
pub async fn spawn_stub() -> Result<(Url, oneshot::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url: Url = format!("http://{}", listener.local_addr()?).parse()?;
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(songlib_server::stub::serve(listener, async {
        rx.await.ok();
    }));
    Ok((url, tx))
}

pub fn test_config(test_name: &str, music_info_url: &Url) -> Result<(ServerConfig, TempDir)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let args = &[
        "songlib-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--music-info-url",
        music_info_url.as_str(),
        "--lookup-timeout",
        "5s",
        "--default-limit",
        "2",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((config, tmp_data_dir))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, EnvGuard)> {
    let (stub_url, stub_shutdown) = spawn_stub().await?;
    let (config, data_dir) = test_config(test_name, &stub_url)?;
    Ok((
        config,
        EnvGuard {
            data_dir,
            stub_shutdown,
        },
    ))
}

/// Runs server in background task, returns its base URL
pub async fn spawn_server(args: ServerConfig) -> Result<Url> {
    let state = songlib_server::build_state(&args).await?;
    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let listener = TcpListener::bind((ip, args.port)).await?;
    let base_url: Url = format!("http://{}/", listener.local_addr()?).parse()?;
    info!("Test server at {base_url}");
    tokio::spawn(async move {
        if let Err(e) =
            run_graceful_with_listener(&args, state, listener, std::future::pending()).await
        {
            error!("Test server failed: {e}");
        }
    });
    Ok(base_url)
}
