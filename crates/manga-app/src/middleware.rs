pub mod rate_limit;
pub mod recover;

pub use rate_limit::{rate_limit, RateLimitConfig, RateLimiter};
pub use recover::catch_panic_layer;
