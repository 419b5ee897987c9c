use axum::{response::IntoResponse, routing::post, Json};
use http::StatusCode;
use manga_dal::user::{CreateUser, UserRepository};
use serde_json::json;

use crate::{error::ApiResult, json::ReadJson, repository_from_request, state::AppState, validate::Garde};

repository_from_request!(UserRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(register_user))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Users", operation_id = "registerUser",
    request_body = CreateUser,
    responses((status = StatusCode::CREATED, description = "Registered new user", body = manga_dal::user::User))))]
pub async fn register_user(
    user_registry: UserRepository,
    Garde(ReadJson(payload)): Garde<ReadJson<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(payload).await?;

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub fn users_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", post(register_user))
}
