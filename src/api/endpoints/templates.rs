//! Template presets, custom templates, and per-user settings.

use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};

use super::super::error::ApiError;
use super::super::extract::Json;
use super::super::types::{ApiContext, AuthContext};
use super::lock_db;
use crate::db::repository::{
    get_preset, get_settings, list_presets, upsert_custom_template, upsert_settings,
};
use crate::models::{TemplatePreset, UserSettings};

/// Retention periods below a day or beyond ten years are configuration
/// mistakes, not preferences.
const MIN_RETENTION_DAYS: u32 = 1;
const MAX_RETENTION_DAYS: u32 = 3650;

pub async fn presets(
    Extension(ctx): Extension<ApiContext>,
) -> Result<Json<Vec<TemplatePreset>>, ApiError> {
    let conn = lock_db(&ctx)?;
    Ok(Json(list_presets(&conn)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTemplateRequest {
    pub instructions: String,
}

pub async fn put_custom_template(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CustomTemplateRequest>,
) -> Result<Json<Value>, ApiError> {
    let instructions = request.instructions.trim();
    if instructions.is_empty() {
        return Err(ApiError::BadRequest("instructions must not be empty".into()));
    }

    let conn = lock_db(&ctx)?;
    upsert_custom_template(&conn, &auth.user_id, instructions)?;
    Ok(Json(json!({ "saved": true })))
}

pub async fn get_user_settings(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserSettings>, ApiError> {
    let conn = lock_db(&ctx)?;
    Ok(Json(get_settings(&conn, &auth.user_id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub template_preset: Option<String>,
    pub retention_days: u32,
}

pub async fn put_user_settings(
    Extension(ctx): Extension<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<UserSettings>, ApiError> {
    if request.retention_days < MIN_RETENTION_DAYS || request.retention_days > MAX_RETENTION_DAYS {
        return Err(ApiError::BadRequest(format!(
            "retentionDays must be between {MIN_RETENTION_DAYS} and {MAX_RETENTION_DAYS}"
        )));
    }

    let conn = lock_db(&ctx)?;
    if let Some(name) = request.template_preset.as_deref() {
        if get_preset(&conn, name)?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Unknown template preset: {name}"
            )));
        }
    }

    let settings = UserSettings {
        template_preset: request.template_preset,
        retention_days: request.retention_days,
    };
    upsert_settings(&conn, &auth.user_id, &settings)?;
    Ok(Json(settings))
}
