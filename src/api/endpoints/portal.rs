//! Patient-facing portal: summary access and global stats.
//!
//! No bearer auth here. A summary is reachable either through an expiring
//! access token or through the summary id paired with the exact patient
//! email it was sent to. Failures are deliberately uniform so the portal
//! cannot be used to probe which ids exist.

use axum::extract::Query;
use axum::Extension;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::ApiContext;
use super::lock_db;
use crate::db::repository::{get_access_token, get_summary, global_stats};
use crate::models::{ChatTurn, GlobalStats, Summary};

#[derive(Debug, Deserialize)]
pub struct PortalAccess {
    pub token: Option<String>,
    pub id: Option<Uuid>,
    pub email: Option<String>,
}

/// Patient-facing projection of a summary. Clinician-only fields
/// (owner id, delivery timestamps) stay out of the portal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSummary {
    pub id: Uuid,
    pub patient_name: String,
    pub generated_text: String,
    pub chat_transcript: Vec<ChatTurn>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<Summary> for PortalSummary {
    fn from(summary: Summary) -> Self {
        Self {
            id: summary.id,
            patient_name: summary.patient_name,
            generated_text: summary.generated_text,
            chat_transcript: summary.chat_transcript,
            created_at: summary.created_at,
        }
    }
}

pub async fn get_portal_summary(
    Extension(ctx): Extension<ApiContext>,
    Query(access): Query<PortalAccess>,
) -> Result<Json<PortalSummary>, ApiError> {
    let summary = resolve_summary(&ctx, &access)?;
    Ok(Json(summary.into()))
}

pub async fn stats(
    Extension(ctx): Extension<ApiContext>,
) -> Result<Json<GlobalStats>, ApiError> {
    let conn = lock_db(&ctx)?;
    Ok(Json(global_stats(&conn)?))
}

/// Resolve portal credentials to a summary. Token access is checked for
/// expiry before any content is loaded; id+email access requires an
/// exact match against the stored patient email.
pub(crate) fn resolve_summary(
    ctx: &ApiContext,
    access: &PortalAccess,
) -> Result<Summary, ApiError> {
    let conn = lock_db(ctx)?;

    if let Some(token) = access.token.as_deref() {
        let access_token = get_access_token(&conn, token)?.ok_or(ApiError::Unauthorized)?;
        if access_token.is_expired(Utc::now()) {
            return Err(ApiError::TokenExpired);
        }
        return get_summary(&conn, &access_token.summary_id)?.ok_or(ApiError::Unauthorized);
    }

    if let (Some(id), Some(email)) = (&access.id, access.email.as_deref()) {
        let summary = get_summary(&conn, id)?.ok_or(ApiError::Unauthorized)?;
        let matches = summary
            .patient_email
            .as_deref()
            .is_some_and(|stored| stored.eq_ignore_ascii_case(email.trim()));
        if !matches {
            return Err(ApiError::Unauthorized);
        }
        return Ok(summary);
    }

    Err(ApiError::Unauthorized)
}
