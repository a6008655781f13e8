//! Bearer-token authentication for clinician routes.
//!
//! Tokens are random strings handed out at provisioning time; only the
//! SHA-256 hash is stored. A valid token resolves to a user row and the
//! request proceeds with an [`AuthContext`] attached.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use super::super::error::ApiError;
use super::super::types::{hash_token, ApiContext, AuthContext};
use crate::db::repository::find_user_by_token_hash;

pub async fn require_auth(
    Extension(ctx): Extension<ApiContext>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(token);

    let user = {
        let conn = ctx
            .db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
        find_user_by_token_hash(&conn, &token_hash)?
    };

    let Some(user) = user else {
        tracing::debug!("Rejected request with unknown bearer token");
        return Err(ApiError::Unauthorized);
    };

    request.extensions_mut().insert(AuthContext {
        user_id: user.id,
        email: user.email,
    });

    let mut response = next.run(request).await;
    // Authenticated responses carry clinical data; never cache them.
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    Ok(response)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        let request = request_with_auth("Bearer abc123");
        assert_eq!(bearer_token(&request), Some("abc123"));
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let request = request_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&request), None);
    }

    #[test]
    fn rejects_empty_token() {
        let request = request_with_auth("Bearer ");
        assert_eq!(bearer_token(&request), None);
    }

    #[test]
    fn missing_header_yields_none() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&request), None);
    }
}
