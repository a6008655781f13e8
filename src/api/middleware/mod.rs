//! Request middleware: bearer auth, rate limiting, security headers.

mod auth;
mod headers;
mod rate;

pub use auth::require_auth;
pub use headers::security_headers;
pub use rate::rate_limit;
