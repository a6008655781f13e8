use serde_json::{json, Value};

use super::super::extract::Json;
use crate::config::APP_VERSION;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": APP_VERSION,
    }))
}
