//! Summary generation and management.

use axum::extract::Path;
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::{ApiContext, AuthContext};
use super::{decode_base64_chunked, lock_db};
use crate::db::repository::{
    delete_summary, get_summary, insert_summary, list_summaries,
};
use crate::extraction::extract_text;
use crate::models::{ChatTurn, Summary};
use crate::prompts::resolve_template;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub patient_name: String,
    /// Pre-extracted or pasted document text.
    pub document_text: Option<String>,
    /// Raw uploaded file, for direct ingestion or local extraction.
    pub file: Option<FilePayload>,
    /// Inline template override, top of the resolution chain.
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

pub async fn generate(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Summary>, ApiError> {
    if request.patient_name.trim().is_empty() {
        return Err(ApiError::BadRequest("patientName is required".into()));
    }
    if request.document_text.is_none() && request.file.is_none() {
        return Err(ApiError::BadRequest(
            "Either documentText or file is required".into(),
        ));
    }

    let template = {
        let conn = lock_db(&ctx)?;
        resolve_template(&conn, &auth.user_id, request.template.as_deref())?
    };

    let original_filename = request.file.as_ref().map(|f| f.name.clone());

    let generated_text = match &request.file {
        Some(file) if ctx.providers.files.accepts_mime(&file.mime_type) => {
            let bytes = decode_base64_chunked(&file.data)?;
            tracing::info!(
                file = %file.name,
                mime = %file.mime_type,
                size = bytes.len(),
                "Generating summary from uploaded file"
            );
            ctx.providers
                .files
                .generate_from_file(bytes, &file.mime_type, &file.name, &template)
                .await?
        }
        _ => {
            let text = match (&request.document_text, &request.file) {
                (Some(text), _) if !text.trim().is_empty() => text.clone(),
                (_, Some(file)) => {
                    let bytes = decode_base64_chunked(&file.data)?;
                    extract_text(&file.name, &file.mime_type, &bytes)
                }
                _ => return Err(ApiError::BadRequest("Document text is empty".into())),
            };
            ctx.providers
                .text
                .complete(&template, &[ChatTurn::user(text)])
                .await?
        }
    };

    let summary = Summary {
        id: Uuid::new_v4(),
        user_id: auth.user_id,
        patient_name: request.patient_name,
        original_filename,
        generated_text,
        patient_email: None,
        sent_at: None,
        follow_up_sent_at: None,
        chat_transcript: vec![],
        created_at: Utc::now(),
    };

    {
        let conn = lock_db(&ctx)?;
        insert_summary(&conn, &summary)?;
    }
    tracing::info!(summary_id = %summary.id, "Summary generated");

    Ok(Json(summary))
}

pub async fn list(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Summary>>, ApiError> {
    let conn = lock_db(&ctx)?;
    Ok(Json(list_summaries(&conn, &auth.user_id)?))
}

pub async fn get_one(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Summary>, ApiError> {
    let conn = lock_db(&ctx)?;
    let summary = get_summary(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("summary {id} not found")))?;
    if summary.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(summary))
}

pub async fn delete(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = lock_db(&ctx)?;
    // Distinguish "not yours" from "does not exist".
    match get_summary(&conn, &id)? {
        None => return Err(ApiError::NotFound(format!("summary {id} not found"))),
        Some(summary) if summary.user_id != auth.user_id => return Err(ApiError::Forbidden),
        Some(_) => {}
    }
    delete_summary(&conn, &auth.user_id, &id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
