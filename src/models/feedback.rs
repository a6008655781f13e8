use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One anonymous patient feedback submission. Never mutated after insert.
///
/// Four ratings are on a 1–5 scale; `recommendation` is 1–10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub session_id: String,
    pub summary_id: Option<Uuid>,
    pub ease_of_understanding: Option<u8>,
    pub usefulness: Option<u8>,
    pub clarity: Option<u8>,
    pub trust: Option<u8>,
    pub recommendation: Option<u8>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate numbers for the public stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub summaries_generated: i64,
    pub transcriptions_processed: i64,
    pub feedback_count: i64,
    pub average_recommendation: Option<f64>,
}
