use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A consultation recording's lifecycle row.
///
/// Created empty when the clinician starts recording, then filled in two
/// subsequent steps: speech-to-text writes `transcript`, and notes
/// generation writes `clinical_notes` + `patient_summary` together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub audio_duration_secs: Option<f64>,
    pub transcript: Option<String>,
    pub clinical_notes: Option<String>,
    pub patient_summary: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
