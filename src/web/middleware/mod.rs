//! HTTP middleware and request extractors.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_meta;

pub use auth::{session_auth, OptionalSessionUser, SessionState, SessionUser};
pub use cors::create_cors_layer;
pub use rate_limit::{ip_rate_limit, RateLimitState};
pub use request_meta::ClientMeta;
