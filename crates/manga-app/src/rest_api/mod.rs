use axum::extract::{FromRequestParts, Path};
use http::{request::Parts, Method};

use crate::error::ApiError;

pub mod health;
pub mod manga;
pub mod paging;

pub use paging::ListQuery;

/// Record id from the `{id}` path segment. Anything that is not an integer is a 404.
#[derive(Debug, Clone, Copy)]
pub struct IdParam(pub i64);

impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state).await?;
        Ok(IdParam(id))
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
