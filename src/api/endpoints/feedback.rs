//! Anonymous patient feedback intake.

use axum::extract::Path;
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::{ApiContext, AuthContext};
use super::lock_db;
use crate::db::repository::{get_summary, insert_feedback, list_feedback_for_summary};
use crate::models::Feedback;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub session_id: String,
    pub summary_id: Option<Uuid>,
    pub ease_of_understanding: Option<u8>,
    pub usefulness: Option<u8>,
    pub clarity: Option<u8>,
    pub trust: Option<u8>,
    pub recommendation: Option<u8>,
    pub comment: Option<String>,
}

pub async fn submit(
    Extension(ctx): Extension<ApiContext>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".into()));
    }
    validate_rating("easeOfUnderstanding", request.ease_of_understanding, 5)?;
    validate_rating("usefulness", request.usefulness, 5)?;
    validate_rating("clarity", request.clarity, 5)?;
    validate_rating("trust", request.trust, 5)?;
    validate_rating("recommendation", request.recommendation, 10)?;

    let feedback = Feedback {
        id: Uuid::new_v4(),
        session_id: request.session_id,
        summary_id: request.summary_id,
        ease_of_understanding: request.ease_of_understanding,
        usefulness: request.usefulness,
        clarity: request.clarity,
        trust: request.trust,
        recommendation: request.recommendation,
        comment: request
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        created_at: Utc::now(),
    };

    {
        let conn = lock_db(&ctx)?;
        insert_feedback(&conn, &feedback)?;
    }
    tracing::info!(feedback_id = %feedback.id, "Feedback recorded");

    Ok(Json(json!({ "received": true })))
}

/// Clinician view of the feedback left on one of their summaries.
pub async fn list_for_summary(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    let conn = lock_db(&ctx)?;
    let summary = get_summary(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("summary {id} not found")))?;
    if summary.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(list_feedback_for_summary(&conn, &id)?))
}

fn validate_rating(field: &str, value: Option<u8>, max: u8) -> Result<(), ApiError> {
    match value {
        Some(v) if v < 1 || v > max => Err(ApiError::BadRequest(format!(
            "{field} must be between 1 and {max}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_ratings_pass() {
        assert!(validate_rating("clarity", Some(1), 5).is_ok());
        assert!(validate_rating("clarity", Some(5), 5).is_ok());
        assert!(validate_rating("recommendation", Some(10), 10).is_ok());
        assert!(validate_rating("clarity", None, 5).is_ok());
    }

    #[test]
    fn out_of_range_ratings_rejected() {
        assert!(validate_rating("clarity", Some(0), 5).is_err());
        assert!(validate_rating("clarity", Some(6), 5).is_err());
        assert!(validate_rating("recommendation", Some(11), 10).is_err());
    }
}
