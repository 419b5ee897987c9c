pub mod error;
pub mod json;
pub mod middleware;
pub mod rest_api;
pub mod state;
pub mod user;
pub mod validate;

/// Lets a store repository be taken directly as a handler argument,
/// bound to the shared pool and the configured query timeout.
#[macro_export]
macro_rules! repository_from_request {
    ($repo:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $repo {
            type Rejection = http::StatusCode;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(
                    <$repo>::new(state.pool().clone()).with_timeout(state.config().query_timeout),
                ))
            }
        }
    };
}
