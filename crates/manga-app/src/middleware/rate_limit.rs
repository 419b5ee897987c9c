use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{connect_info::MockConnectInfo, ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ApiError;

pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
pub const MAX_IDLE: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Sustained requests per second allowed for one client
    pub rps: f64,
    /// Requests a fresh client may fire at once
    pub burst: u32,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rps: 2.0,
            burst: 4,
            enabled: true,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

/// Token bucket per client address.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<IpAddr, Bucket>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes one token for `ip`, returns false when the bucket is empty.
    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let burst = f64::from(self.config.burst);
        let mut clients = self.clients();
        let bucket = clients.entry(ip).or_insert(Bucket {
            tokens: burst,
            last_seen: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_seen);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.config.rps).min(burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drops clients not seen for `max_idle`, returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.evict_idle_at(max_idle, Instant::now())
    }

    fn evict_idle_at(&self, max_idle: Duration, now: Instant) -> usize {
        let mut clients = self.clients();
        let before = clients.len();
        clients.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < max_idle);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients().len()
    }

    /// Periodically evicts idle clients, ends once the limiter itself is dropped.
    pub fn spawn_cleanup(self: &Arc<Self>, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let limiter = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let evicted = limiter.evict_idle(max_idle);
                if evicted > 0 {
                    debug!("Evicted {evicted} idle clients from rate limiter");
                }
            }
        })
    }
}

/// Middleware rejecting requests with 429 once a client runs out of tokens.
///
/// Needs the router to be served with `ConnectInfo<SocketAddr>`, otherwise nothing is limited.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.enabled() {
        if let Some(addr) = client_addr(&request) {
            if !limiter.allow(addr.ip()) {
                debug!("Rate limit exceeded for {}", addr.ip());
                return ApiError::RateLimitExceeded.into_response();
            }
        }
    }
    next.run(request).await
}

fn client_addr(request: &Request) -> Option<SocketAddr> {
    let extensions = request.extensions();
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|MockConnectInfo(addr)| *addr)
        })
}
