//! Email delivery of summaries and follow-ups.
//!
//! Ownership and email syntax are checked before any external call. A
//! failed timestamp write after a successful send is logged, not
//! surfaced: the email is already gone.

use axum::extract::Path;
use axum::Extension;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::{generate_token, ApiContext, AuthContext};
use super::lock_db;
use crate::db::repository::{
    get_summary, insert_access_token, set_summary_follow_up, set_summary_sent,
    set_transcription_sent,
};
use crate::models::{PatientAccessToken, Summary};

/// Portal links stay valid this long after the send.
const ACCESS_TOKEN_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub patient_email: String,
}

pub async fn send_summary(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendRequest>,
) -> Result<Json<Value>, ApiError> {
    let summary = require_owned_summary(&ctx, &auth, &id)?;

    let email = request.patient_email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("Invalid patient email address".into()));
    }

    // Mint the expiring portal link before the send so the email can
    // carry it.
    let access = PatientAccessToken {
        token: generate_token(),
        summary_id: summary.id,
        expires_at: Utc::now() + Duration::days(ACCESS_TOKEN_DAYS),
        created_at: Utc::now(),
    };
    {
        let conn = lock_db(&ctx)?;
        insert_access_token(&conn, &access)?;
    }

    let portal_url = format!(
        "{}/portal/summary?token={}",
        ctx.config.public_base_url, access.token
    );
    let html = summary_email_html(&summary, &portal_url);
    let subject = format!("Your visit summary from {}", crate::config::APP_NAME);

    ctx.providers.mailer.send(email, &subject, &html).await?;
    tracing::info!(summary_id = %id, "Summary email sent");

    let marked = {
        let conn = lock_db(&ctx)?;
        set_summary_sent(&conn, &id, email, Utc::now())
    };
    if let Err(e) = marked {
        tracing::error!(summary_id = %id, error = %e, "Email sent but sent_at update failed");
    }

    Ok(Json(json!({ "sent": true })))
}

pub async fn send_follow_up(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let summary = require_owned_summary(&ctx, &auth, &id)?;

    let Some(email) = summary.patient_email.as_deref() else {
        return Err(ApiError::BadRequest(
            "Summary has not been sent to a patient yet".into(),
        ));
    };

    // The session id ties feedback rows together; it carries no
    // server-side expiry or single-use enforcement.
    let session_id = generate_token();
    let feedback_url = format!(
        "{}/portal/feedback?session={}&summary={}",
        ctx.config.public_base_url, session_id, summary.id
    );
    let html = follow_up_email_html(&summary.patient_name, &feedback_url);
    let subject = "How was your visit summary?".to_string();

    ctx.providers.mailer.send(email, &subject, &html).await?;
    tracing::info!(summary_id = %id, "Follow-up email sent");

    let marked = {
        let conn = lock_db(&ctx)?;
        set_summary_follow_up(&conn, &id, Utc::now())
    };
    if let Err(e) = marked {
        tracing::error!(summary_id = %id, error = %e, "Follow-up sent but timestamp update failed");
    }

    Ok(Json(json!({ "sent": true, "sessionId": session_id })))
}

pub async fn send_transcription_summary(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendRequest>,
) -> Result<Json<Value>, ApiError> {
    let transcription = super::transcriptions::require_owned(&ctx, &auth, &id)?;

    let email = request.patient_email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("Invalid patient email address".into()));
    }

    let Some(patient_summary) = transcription.patient_summary.as_deref() else {
        return Err(ApiError::BadRequest(
            "No patient summary generated for this consultation yet".into(),
        ));
    };

    let html = transcription_email_html(&transcription.patient_name, patient_summary);
    let subject = format!("Your consultation summary from {}", crate::config::APP_NAME);

    ctx.providers.mailer.send(email, &subject, &html).await?;
    tracing::info!(transcription_id = %id, "Consultation summary email sent");

    let marked = {
        let conn = lock_db(&ctx)?;
        set_transcription_sent(&conn, &id, email, Utc::now())
    };
    if let Err(e) = marked {
        tracing::error!(transcription_id = %id, error = %e, "Email sent but sent_at update failed");
    }

    Ok(Json(json!({ "sent": true })))
}

fn require_owned_summary(
    ctx: &ApiContext,
    auth: &AuthContext,
    id: &Uuid,
) -> Result<Summary, ApiError> {
    let conn = lock_db(ctx)?;
    let summary = get_summary(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("summary {id} not found")))?;
    if summary.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(summary)
}

/// Structural email check: one `@`, non-empty local part, domain with a dot.
/// Deliverability is the mail provider's problem.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2 && !domain.contains("..")
}

fn summary_email_html(summary: &Summary, portal_url: &str) -> String {
    let body = escape_html(&summary.generated_text).replace('\n', "<br>");
    format!(
        "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2>Hello {name},</h2>\
         <p>Your care team has prepared a summary of your visit:</p>\
         <div style=\"background: #f5f7fa; padding: 16px; border-radius: 8px;\">{body}</div>\
         <p><a href=\"{portal_url}\">View your summary online and ask questions</a></p>\
         <p>This link expires in {days} days.</p>\
         </div>",
        name = escape_html(&summary.patient_name),
        days = ACCESS_TOKEN_DAYS,
    )
}

fn follow_up_email_html(patient_name: &str, feedback_url: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2>Hello {name},</h2>\
         <p>A few days ago you received a summary of your visit. We would love to \
         hear how useful it was.</p>\
         <p><a href=\"{feedback_url}\">Share your feedback (takes one minute)</a></p>\
         </div>",
        name = escape_html(patient_name),
    )
}

fn transcription_email_html(patient_name: &str, patient_summary: &str) -> String {
    let body = escape_html(patient_summary).replace('\n', "<br>");
    format!(
        "<div style=\"font-family: sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2>Hello {name},</h2>\
         <p>Here is a summary of your recent consultation:</p>\
         <div style=\"background: #f5f7fa; padding: 16px; border-radius: 8px;\">{body}</div>\
         </div>",
        name = escape_html(patient_name),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("foo@bar.com"));
        assert!(is_valid_email("first.last@clinic.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@bar.com"));
        assert!(!is_valid_email("foo@"));
        assert!(!is_valid_email("foo@bar"));
        assert!(!is_valid_email("foo @bar.com"));
        assert!(!is_valid_email("foo@bar..com"));
        assert!(!is_valid_email("foo@bar.c"));
    }

    #[test]
    fn summary_email_escapes_html() {
        let summary = Summary {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            patient_name: "A <b>Patient</b>".into(),
            original_filename: None,
            generated_text: "Take 5mg <daily>".into(),
            patient_email: None,
            sent_at: None,
            follow_up_sent_at: None,
            chat_transcript: vec![],
            created_at: Utc::now(),
        };
        let html = summary_email_html(&summary, "https://example.com/portal");
        assert!(html.contains("&lt;daily&gt;"));
        assert!(html.contains("A &lt;b&gt;Patient&lt;/b&gt;"));
        assert!(html.contains("https://example.com/portal"));
    }

    #[test]
    fn follow_up_email_carries_feedback_url() {
        let html = follow_up_email_html("Alex", "https://example.com/portal/feedback?session=s1");
        assert!(html.contains("session=s1"));
    }
}
