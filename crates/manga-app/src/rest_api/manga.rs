use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use http::{header, HeaderMap, StatusCode};
use manga_dal::manga::{
    CreateManga, MangaRepository, UpdateManga, DEFAULT_SORT, MANGA_SORT_SAFELIST,
};
use manga_types::Validator;
use serde_json::json;
use tracing::debug;

use super::{IdParam, ListQuery};
use crate::{
    error::{ApiError, ApiResult},
    json::ReadJson,
    state::AppState,
};

pub const EXPECTED_VERSION_HEADER: &str = "X-Expected-Version";

crate::repository_from_request!(MangaRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(create, list, get_manga, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

fn check(v: Validator) -> ApiResult<()> {
    if v.valid() {
        Ok(())
    } else {
        Err(ApiError::FailedValidation(v))
    }
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Manga", operation_id = "createManga",
    request_body = CreateManga,
    responses((status = StatusCode::CREATED, description = "Created manga", body = manga_dal::manga::Manga))))]
pub async fn create(
    repository: MangaRepository,
    ReadJson(payload): ReadJson<CreateManga>,
) -> ApiResult<impl IntoResponse> {
    let mut v = Validator::new();
    payload.validate(&mut v);
    check(v)?;

    let manga = repository.create(payload).await?;
    let location = format!("/v1/manga/{}", manga.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "manga": manga })),
    ))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = "Manga", operation_id = "getManga",
    responses((status = StatusCode::OK, description = "Get one", body = manga_dal::manga::Manga))))]
pub async fn get_manga(
    IdParam(id): IdParam,
    repository: MangaRepository,
) -> ApiResult<impl IntoResponse> {
    let manga = repository.get(id).await?;

    Ok((StatusCode::OK, Json(json!({ "manga": manga }))))
}

fn expected_version(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(EXPECTED_VERSION_HEADER)
        .map(|value| value.to_str().unwrap_or_default().trim())
}

#[cfg_attr(feature = "openapi",  utoipa::path(patch, path = "/{id}", tag = "Manga", operation_id = "updateManga",
    request_body = UpdateManga,
    params(("X-Expected-Version" = Option<i64>, Header, description = "Fail with 409 unless the stored version matches")),
    responses((status = StatusCode::OK, description = "Updated manga", body = manga_dal::manga::Manga))))]
pub async fn update(
    IdParam(id): IdParam,
    repository: MangaRepository,
    headers: HeaderMap,
    ReadJson(payload): ReadJson<UpdateManga>,
) -> ApiResult<impl IntoResponse> {
    let mut manga = repository.get(id).await?;

    if let Some(expected) = expected_version(&headers) {
        if expected != manga.version.to_string() {
            debug!(
                "Manga {id} is at version {}, client expected {expected}",
                manga.version
            );
            return Err(ApiError::EditConflict);
        }
    }

    payload.apply(&mut manga);

    let mut v = Validator::new();
    manga.validate(&mut v);
    check(v)?;

    let manga = repository.update(manga).await?;

    Ok((StatusCode::OK, Json(json!({ "manga": manga }))))
}

#[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = "Manga", operation_id = "deleteManga",
    responses((status = StatusCode::OK, description = "Deleted successfully"))))]
pub async fn delete(
    IdParam(id): IdParam,
    repository: MangaRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "manga successfully deleted" })),
    ))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Manga", operation_id = "listManga",
    params(ListQuery),
    responses((status = StatusCode::OK, description = "One page of manga with pagination metadata", body = Vec<manga_dal::manga::Manga>))))]
pub async fn list(
    repository: MangaRepository,
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;

    let mut v = Validator::new();
    let filters = query.filters(
        state.config().default_page_size,
        MANGA_SORT_SAFELIST,
        DEFAULT_SORT,
        &mut v,
    );
    filters.validate(&mut v);
    check(v)?;

    let batch = repository
        .list(query.title(), &query.genres(), &filters)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "manga": batch.rows, "metadata": batch.metadata })),
    ))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(get_manga).patch(update).delete(delete))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request, Router};
    use http_body_util::BodyExt as _;
    use serde_json::Value;
    use tower::ServiceExt as _;

    use super::*;
    use crate::state::AppConfig;

    async fn app() -> Router {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        manga_dal::migrate(&pool).await.unwrap();
        let state = AppState::new(AppConfig::default(), pool);
        Router::new()
            .nest("/v1/manga", router())
            .with_state(state)
    }

    async fn call(app: &Router, request: Request) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn post_json(uri: &str, body: &str) -> Request {
        http::Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn patch_json(uri: &str, body: &str) -> Request {
        http::Request::patch(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const AKIRA: &str =
        r#"{"title": "Akira", "year": 1982, "runtime": "124 mins", "genres": ["action", "sci-fi"]}"#;

    #[tokio::test]
    async fn test_create_get_delete() {
        let app = app().await;

        let (status, headers, body) = call(&app, post_json("/v1/manga", AKIRA)).await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!("/v1/manga/1", headers[header::LOCATION]);
        assert_eq!("Akira", body["manga"]["title"]);
        assert_eq!("124 mins", body["manga"]["runtime"]);
        assert_eq!(1, body["manga"]["version"]);
        assert!(body["manga"].get("created_at").is_none());

        let (status, _, body) = call(&app, http::Request::get("/v1/manga/1").body(Body::empty()).unwrap()).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1982, body["manga"]["year"]);

        let (status, _, body) =
            call(&app, http::Request::delete("/v1/manga/1").body(Body::empty()).unwrap()).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("manga successfully deleted", body["message"]);

        for uri in ["/v1/manga/1", "/v1/manga/0", "/v1/manga/abc"] {
            let (status, _, _) = call(&app, http::Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(StatusCode::NOT_FOUND, status, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_create_validation() {
        let app = app().await;

        let (status, _, body) = call(
            &app,
            post_json("/v1/manga", r#"{"year": 1700, "genres": ["a", "a"], "runtime": "-5 mins"}"#),
        )
        .await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
        assert_eq!("must be provided", body["error"]["title"]);
        assert_eq!("must not be earlier than 1888", body["error"]["year"]);
        assert_eq!("must not be negative", body["error"]["runtime"]);
        assert_eq!("must not contain duplicate values", body["error"]["genres"]);

        let (status, _, _) = call(
            &app,
            post_json("/v1/manga", r#"{"title": "Akira", "year": 1982, "runtime": 124}"#),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let (status, _, body) = call(&app, post_json("/v1/manga", r#"{"title": "Akira""#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let app = app().await;
        call(&app, post_json("/v1/manga", AKIRA)).await;

        let (status, _, body) = call(&app, patch_json("/v1/manga/1", r#"{"year": 1988}"#)).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1988, body["manga"]["year"]);
        assert_eq!("Akira", body["manga"]["title"]);
        assert_eq!(serde_json::json!(["action", "sci-fi"]), body["manga"]["genres"]);
        assert_eq!(2, body["manga"]["version"]);

        let (status, _, body) = call(&app, patch_json("/v1/manga/1", r#"{"title": ""}"#)).await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
        assert_eq!("must be provided", body["error"]["title"]);

        let (status, _, _) = call(&app, patch_json("/v1/manga/42", r#"{"year": 1990}"#)).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[tokio::test]
    async fn test_expected_version() {
        let app = app().await;
        call(&app, post_json("/v1/manga", AKIRA)).await;

        let request = http::Request::patch("/v1/manga/1")
            .header(EXPECTED_VERSION_HEADER, "7")
            .body(Body::from(r#"{"year": 1988}"#))
            .unwrap();
        let (status, _, _) = call(&app, request).await;
        assert_eq!(StatusCode::CONFLICT, status);

        let (_, _, body) = call(&app, http::Request::get("/v1/manga/1").body(Body::empty()).unwrap()).await;
        assert_eq!(1, body["manga"]["version"]);
        assert_eq!(1982, body["manga"]["year"]);

        let request = http::Request::patch("/v1/manga/1")
            .header(EXPECTED_VERSION_HEADER, "1")
            .body(Body::from(r#"{"year": 1988}"#))
            .unwrap();
        let (status, _, body) = call(&app, request).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(2, body["manga"]["version"]);
    }

    #[tokio::test]
    async fn test_list() {
        let app = app().await;
        call(&app, post_json("/v1/manga", AKIRA)).await;
        call(
            &app,
            post_json(
                "/v1/manga",
                r#"{"title": "Monster", "year": 1994, "runtime": "90 mins", "genres": ["thriller"]}"#,
            ),
        )
        .await;

        let (status, _, body) = call(
            &app,
            http::Request::get("/v1/manga?sort=-year&page_size=1").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Monster", body["manga"][0]["title"]);
        assert_eq!(2, body["metadata"]["last_page"]);
        assert_eq!(2, body["metadata"]["total_records"]);

        let (status, _, body) = call(
            &app,
            http::Request::get("/v1/manga?genres=sci-fi,action").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, body["manga"].as_array().unwrap().len());

        let (status, _, body) = call(
            &app,
            http::Request::get("/v1/manga?genres=horror").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert!(body["manga"].as_array().unwrap().is_empty());
        assert_eq!(0, body["metadata"]["total_records"]);

        let (status, _, body) = call(
            &app,
            http::Request::get("/v1/manga?page=0&page_size=x&sort=created_at")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
        assert_eq!("must be greater than zero", body["error"]["page"]);
        assert_eq!("must be an integer value", body["error"]["page_size"]);
        assert_eq!("invalid sort value", body["error"]["sort"]);
    }
}
