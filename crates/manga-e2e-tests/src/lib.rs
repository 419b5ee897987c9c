pub mod rest;

use std::time::Duration;

use anyhow::{Result, anyhow};
use manga_server::{
    build_state,
    config::{Parser, ServerConfig},
    run::run_graceful_with_state,
};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, error};

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(4030..5030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

/// Keeps the temporary data directory alive and stops the server when dropped.
pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub struct TestEnv {
    pub config: ServerConfig,
    pub base_url: Url,
}

impl TestEnv {
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("valid test url")
    }
}

pub fn test_config(test_name: &str, extra_args: &[&str]) -> Result<(TestEnv, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let mut args = vec![
        "manga-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--environment",
        "testing",
    ];
    args.extend_from_slice(extra_args);
    let config = ServerConfig::try_parse_from(args)?;
    let base_url = Url::parse(&format!("http://127.0.0.1:{}/", port))?;
    Ok((
        TestEnv { config, base_url },
        ConfigGuard {
            data_dir: tmp_data_dir,
            shutdown: None,
        },
    ))
}

/// Test environment with the rate limiter switched off.
pub async fn prepare_env(test_name: &str) -> Result<(TestEnv, ConfigGuard)> {
    test_config(test_name, &["--limiter-disabled"])
}

pub async fn spawn_server(env: &TestEnv, guard: &mut ConfigGuard) -> Result<()> {
    let state = build_state(&env.config).await?;
    let (tx, rx) = oneshot::channel::<()>();
    guard.shutdown = Some(tx);

    let config = env.config.clone();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = run_graceful_with_state(config, state, shutdown).await {
            error!("Test server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    let health = env.url("v1/healthcheck");
    for _ in 0..50 {
        if client.get(health.clone()).send().await.is_ok() {
            debug!("Test server is up at {}", env.base_url);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(anyhow!("Test server did not start"))
}

pub async fn launch_env(test_name: &str) -> Result<(TestEnv, ConfigGuard, reqwest::Client)> {
    let (env, mut guard) = prepare_env(test_name).await?;
    spawn_server(&env, &mut guard).await?;
    Ok((env, guard, reqwest::Client::new()))
}
