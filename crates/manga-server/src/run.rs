use std::{net::SocketAddr, sync::Arc};

use crate::config::ServerConfig;
use crate::error::Result;
use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use futures::FutureExt;
use manga_app::{
    json::MAX_BODY_BYTES,
    middleware::{
        catch_panic_layer, rate_limit,
        rate_limit::{CLEANUP_INTERVAL, MAX_IDLE},
        RateLimiter,
    },
    rest_api::{health, manga, method_not_allowed, not_found},
    state::AppState,
    user::users_router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let limiter = Arc::new(RateLimiter::new(args.rate_limit_config()));
    let cleanup = limiter.spawn_cleanup(CLEANUP_INTERVAL, MAX_IDLE);

    let mut app = main_router(state, limiter);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Starting {} server on {}",
        args.environment,
        listener.local_addr()?
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    cleanup.abort();
    info!("Server stopped");
    Ok(())
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    #[derive(utoipa::OpenApi)]
    #[openapi(info(title = "Manga catalog API"))]
    struct OpenApi;

    use utoipa::OpenApi as _;
    OpenApi::openapi()
        .nest("/v1/healthcheck", health::api_docs())
        .nest("/v1/manga", manga::api_docs())
        .nest("/v1/users", manga_app::user::api_docs())
}

pub fn main_router(state: AppState, limiter: Arc<RateLimiter>) -> Router<()> {
    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/v1/healthcheck", health::router())
        .nest("/v1/manga", manga::router())
        .nest("/v1/users", users_router())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs),
        );
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn_with_state(limiter, rate_limit))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http())
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        tokio::fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {}", data_dir.display());
    }

    let database_url = config.database_url();
    let pool = manga_dal::new_pool_with_size(&database_url, config.max_connections).await?;
    manga_dal::migrate(&pool).await?;
    debug!("Database ready at {database_url}");

    Ok(AppState::new(config.app_config(), pool))
}
