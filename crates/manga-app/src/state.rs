use std::{sync::Arc, time::Duration};

use manga_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { pool, app_config }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_page_size: i64,
    pub query_timeout: Duration,
    pub environment: String,
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            query_timeout: manga_dal::DEFAULT_QUERY_TIMEOUT,
            environment: "development".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
