use axum::{extract::State, response::IntoResponse, routing::get, Json};
use http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Health {
    status: &'static str,
    system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SystemInfo {
    environment: String,
    version: String,
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(healthcheck))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Health", operation_id = "healthcheck",
    responses((status = StatusCode::OK, description = "Service status", body = Health))))]
pub async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config();
    (
        StatusCode::OK,
        Json(Health {
            status: "available",
            system_info: SystemInfo {
                environment: config.environment.clone(),
                version: config.version.clone(),
            },
        }),
    )
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/", get(healthcheck))
}
