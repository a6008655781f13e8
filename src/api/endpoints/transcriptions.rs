//! Consultation recordings: row lifecycle, speech-to-text, note generation.

use axum::extract::Path;
use axum::Extension;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::{ApiContext, AuthContext};
use super::{decode_base64_chunked, lock_db};
use crate::db::repository::{
    delete_transcription, get_transcription, insert_transcription, list_transcriptions,
    set_clinical_notes, set_transcript,
};
use crate::models::{ChatTurn, Transcription};
use crate::prompts::{CLINICAL_NOTES_PROMPT, PATIENT_SUMMARY_PROMPT};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub patient_name: String,
    pub patient_email: Option<String>,
}

/// Create the row up-front so the recording has a stable id while the
/// audio is still being captured.
pub async fn create(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<Transcription>, ApiError> {
    if request.patient_name.trim().is_empty() {
        return Err(ApiError::BadRequest("patientName is required".into()));
    }

    let transcription = Transcription {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        patient_name: request.patient_name,
        patient_email: request.patient_email,
        audio_duration_secs: None,
        transcript: None,
        clinical_notes: None,
        patient_summary: None,
        sent_at: None,
        created_at: Utc::now(),
    };

    {
        let conn = lock_db(&ctx)?;
        insert_transcription(&conn, &transcription)?;
    }
    Ok(Json(transcription))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    /// Base64-encoded audio.
    pub audio: String,
    pub file_name: Option<String>,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub transcript: String,
}

pub async fn transcribe(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    require_owned(&ctx, &auth, &id)?;

    let audio = decode_base64_chunked(&request.audio)?;
    let file_name = request.file_name.as_deref().unwrap_or("recording.webm");
    tracing::info!(transcription_id = %id, bytes = audio.len(), "Transcribing audio");

    let transcript = ctx
        .providers
        .speech
        .transcribe(audio, file_name)
        .await?;

    {
        let conn = lock_db(&ctx)?;
        set_transcript(&conn, &id, &transcript, request.duration_secs)?;
    }

    Ok(Json(TranscribeResponse { transcript }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    /// Transcript override; defaults to the stored transcript.
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesResponse {
    pub clinical_notes: String,
    pub patient_summary: String,
}

/// Two independent completions issued concurrently; both must succeed
/// before anything is written back.
pub async fn generate_notes(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<NotesResponse>, ApiError> {
    let stored = require_owned(&ctx, &auth, &id)?;

    let transcript = match request.transcript.or(stored.transcript) {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return Err(ApiError::BadRequest(
                "No transcript available; transcribe the audio first".into(),
            ))
        }
    };

    let turns = [ChatTurn::user(transcript)];
    let (clinical_notes, patient_summary) = tokio::try_join!(
        ctx.providers.text.complete(CLINICAL_NOTES_PROMPT, &turns),
        ctx.providers.text.complete(PATIENT_SUMMARY_PROMPT, &turns),
    )?;

    {
        let conn = lock_db(&ctx)?;
        set_clinical_notes(&conn, &id, &clinical_notes, &patient_summary)?;
    }
    tracing::info!(transcription_id = %id, "Clinical notes generated");

    Ok(Json(NotesResponse {
        clinical_notes,
        patient_summary,
    }))
}

pub async fn list(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Transcription>>, ApiError> {
    let conn = lock_db(&ctx)?;
    Ok(Json(list_transcriptions(&conn, &auth.user_id)?))
}

pub async fn get_one(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transcription>, ApiError> {
    Ok(Json(require_owned(&ctx, &auth, &id)?))
}

pub async fn delete(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_owned(&ctx, &auth, &id)?;
    let conn = lock_db(&ctx)?;
    delete_transcription(&conn, &auth.user_id, &id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Load the row and verify ownership before any payload is considered.
pub(crate) fn require_owned(
    ctx: &ApiContext,
    auth: &AuthContext,
    id: &Uuid,
) -> Result<Transcription, ApiError> {
    let conn = lock_db(ctx)?;
    let transcription = get_transcription(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("transcription {id} not found")))?;
    if transcription.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(transcription)
}
