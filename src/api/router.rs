//! Route wiring: clinician routes under `/api` (bearer auth + rate
//! limit), patient routes under `/portal` (rate limit only).

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use super::endpoints::{
    chat, delivery, feedback, health, portal, summaries, templates, transcriptions,
};
use super::middleware::{rate_limit, require_auth, security_headers};
use super::types::ApiContext;
use crate::config::MAX_BODY_BYTES;

pub fn build_router(ctx: ApiContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .nest("/api", api_router())
        .nest("/portal", portal_router())
        .layer(middleware::from_fn(rate_limit))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(ctx));

    security_headers(router)
}

fn api_router() -> Router {
    let authed = Router::new()
        .route("/summaries/generate", post(summaries::generate))
        .route("/summaries", get(summaries::list))
        .route(
            "/summaries/:id",
            get(summaries::get_one).delete(summaries::delete),
        )
        .route("/summaries/:id/send", post(delivery::send_summary))
        .route("/summaries/:id/follow-up", post(delivery::send_follow_up))
        .route("/summaries/:id/feedback", get(feedback::list_for_summary))
        .route(
            "/transcriptions",
            post(transcriptions::create).get(transcriptions::list),
        )
        .route(
            "/transcriptions/:id",
            get(transcriptions::get_one).delete(transcriptions::delete),
        )
        .route(
            "/transcriptions/:id/transcribe",
            post(transcriptions::transcribe),
        )
        .route(
            "/transcriptions/:id/notes",
            post(transcriptions::generate_notes),
        )
        .route(
            "/transcriptions/:id/send",
            post(delivery::send_transcription_summary),
        )
        .route(
            "/settings",
            get(templates::get_user_settings).put(templates::put_user_settings),
        )
        .route("/templates/presets", get(templates::presets))
        .route("/templates/custom", put(templates::put_custom_template))
        .route_layer(middleware::from_fn(require_auth));

    // Health stays outside auth so probes need no credentials.
    Router::new()
        .route("/health", get(health::health))
        .merge(authed)
}

fn portal_router() -> Router {
    Router::new()
        .route("/summary", get(portal::get_portal_summary))
        .route("/chat", post(chat::chat))
        .route("/feedback", post(feedback::submit))
        .route("/stats", get(portal::stats))
}
