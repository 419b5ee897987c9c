use std::ops::Deref;

use axum::extract::{FromRequest, Request};
use garde::Validate;
use manga_types::Validator;

use crate::error::ApiError;

/// Runs `garde` validation on whatever the inner extractor produced.
///
/// Failures are reported through the same 422 envelope as hand written checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Garde<E>(pub E);

impl<E> Deref for Garde<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, Extractor, T> FromRequest<S> for Garde<Extractor>
where
    S: Send + Sync,
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<S>,
    <Extractor as FromRequest<S>>::Rejection: Into<ApiError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state)
            .await
            .map_err(Into::into)?;

        inner
            .deref()
            .validate()
            .map_err(|report| ApiError::FailedValidation(Validator::from(report)))?;
        Ok(Garde(inner))
    }
}
