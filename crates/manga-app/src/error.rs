use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use http::{Method, StatusCode};
use manga_types::Validator;
use serde_json::json;
use tracing::{debug, error};

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    #[error("{0}")]
    BadRequest(String),

    #[error("failed validation")]
    FailedValidation(Validator),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("the server encountered a problem and could not process your request")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn failed_validation(field: &str, message: &str) -> Self {
        let mut v = Validator::new();
        v.add_error(field, message);
        ApiError::FailedValidation(v)
    }
}

impl From<manga_dal::Error> for ApiError {
    fn from(e: manga_dal::Error) -> Self {
        match e {
            manga_dal::Error::RecordNotFound(what) => {
                debug!("Not found: {what}");
                ApiError::NotFound
            }
            manga_dal::Error::EditConflict { id, version } => {
                debug!("Edit conflict on {id} at version {version}");
                ApiError::EditConflict
            }
            manga_dal::Error::DuplicateEmail => ApiError::failed_validation(
                "email",
                "a user with this email address already exists",
            ),
            manga_dal::Error::InvalidOrderByField(_) => {
                ApiError::failed_validation("sort", "invalid sort value")
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("Invalid path parameter: {rejection}");
        ApiError::NotFound
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::FailedValidation(v) => (status, Json(json!({ "error": v }))).into_response(),
            ApiError::Internal(ref e) => {
                error!("Internal error: {e:#}");
                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
