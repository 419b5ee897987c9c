use std::{path::PathBuf, time::Duration};

pub use clap::Parser;
use manga_app::{middleware::RateLimitConfig, state::AppConfig};

use crate::error::Result;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Manga catalog REST service")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "MANGA_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "MANGA_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "MANGA_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/manga.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "MANGA_DATA_DIR",
        help = "Data directory for the database, default is system default like ~/.local/share/manga-catalog",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "MANGA_DB_MAX_CONNECTIONS",
        default_value_t = manga_dal::DEFAULT_MAX_CONNECTIONS,
        help = "Maximum number of pooled database connections"
    )]
    pub max_connections: u32,

    #[arg(
        long,
        env = "MANGA_QUERY_TIMEOUT",
        default_value = "3s",
        help = "Time limit for a single database operation in human friendly format (e.g. 3s, 500ms)",
        value_parser = humantime::parse_duration
    )]
    pub query_timeout: Duration,

    #[arg(
        long,
        env = "MANGA_DEFAULT_PAGE_SIZE",
        default_value_t = 20,
        value_parser = clap::value_parser!(i64).range(1..=100),
        help = "Page size used when a listing does not ask for one"
    )]
    pub default_page_size: i64,

    #[arg(
        short,
        long,
        env = "MANGA_ENV",
        default_value = "development",
        help = "Environment name reported by the health check (development|staging|production)"
    )]
    pub environment: String,

    #[arg(long, env = "MANGA_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,

    #[arg(
        long,
        env = "MANGA_LIMITER_RPS",
        default_value_t = 2.0,
        help = "Rate limiter sustained requests per second per client"
    )]
    pub limiter_rps: f64,

    #[arg(
        long,
        env = "MANGA_LIMITER_BURST",
        default_value_t = 4,
        help = "Rate limiter burst size per client"
    )]
    pub limiter_burst: u32,

    #[arg(long, env = "MANGA_LIMITER_DISABLED", help = "Disable the rate limiter")]
    pub limiter_disabled: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("manga-catalog"))
        .unwrap_or_else(|| PathBuf::from("manga-catalog"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/manga.db", self.data_dir))
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            default_page_size: self.default_page_size,
            query_timeout: self.query_timeout,
            environment: self.environment.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            rps: self.limiter_rps,
            burst: self.limiter_burst,
            enabled: !self.limiter_disabled,
        }
    }
}
