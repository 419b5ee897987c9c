use std::ops::Deref;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON body extractor that reports every decoding problem as a 400 with a readable reason.
///
/// Unlike [`axum::Json`] it does not insist on a `Content-Type` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadJson<T>(pub T);

impl<T> Deref for ReadJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ReadJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::BadRequest(format!(
                    "body must not be larger than {MAX_BODY_BYTES} bytes"
                ))
            } else {
                ApiError::BadRequest(rejection.body_text())
            }
        })?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("body must not be empty".to_string()));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ReadJson(value))
    }
}
