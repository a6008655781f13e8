use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chat::ChatTurn;

/// A stored patient-friendly translation of a medical document.
///
/// Created by the generation endpoint; mutated by the delivery endpoints
/// (timestamps, patient email) and by the chat endpoint (transcript append).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub patient_name: String,
    pub original_filename: Option<String>,
    pub generated_text: String,
    pub patient_email: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub follow_up_sent_at: Option<DateTime<Utc>>,
    /// Append-only ordered sequence of chat turns.
    pub chat_transcript: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
}

/// Expiring link granting a patient access to one summary.
#[derive(Debug, Clone)]
pub struct PatientAccessToken {
    pub token: String,
    pub summary_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PatientAccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_expiry_is_inclusive() {
        let now = Utc::now();
        let token = PatientAccessToken {
            token: "t".into(),
            summary_id: Uuid::new_v4(),
            expires_at: now,
            created_at: now - Duration::days(1),
        };
        assert!(token.is_expired(now));
        assert!(!token.is_expired(now - Duration::seconds(1)));
    }
}
