//! Summary-scoped chat assistant for patients.

use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::ApiContext;
use super::portal::{resolve_summary, PortalAccess};
use super::lock_db;
use crate::db::repository::set_chat_transcript;
use crate::models::ChatTurn;
use crate::prompts::chat_system_prompt;

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub token: Option<String>,
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat(
    Extension(ctx): Extension<ApiContext>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let access = PortalAccess {
        token: request.token,
        id: request.id,
        email: request.email,
    };
    let summary = resolve_summary(&ctx, &access)?;

    let system = chat_system_prompt(&summary.generated_text);
    let mut turns = summary.chat_transcript.clone();
    turns.push(ChatTurn::user(message));

    let reply = ctx.providers.text.complete(&system, &turns).await?;

    // Persist both turns only after the model answered; a failed call
    // leaves the transcript untouched.
    turns.push(ChatTurn::assistant(reply.clone()));
    {
        let conn = lock_db(&ctx)?;
        set_chat_transcript(&conn, &summary.id, &turns)?;
    }

    Ok(Json(ChatResponse { reply }))
}
