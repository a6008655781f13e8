//! HTTP API: router, middleware, handlers, and shared state.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::build_router;
pub use types::{generate_token, hash_token, ApiContext, AuthContext};
