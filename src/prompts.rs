//! Prompt templates and per-user template resolution.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_custom_template, get_preset, get_settings};
use crate::db::DatabaseError;

/// Hardcoded last-resort template when the user has configured nothing.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "Rewrite the medical document below for the patient \
it concerns. Use plain, warm language a layperson understands. Explain any medical term the \
first time it appears. Keep all medication names, doses, and dates exactly as written. End \
with a short list of warning signs that should prompt the patient to contact their care team.";

/// System prompt for the clinical-note completion.
pub const CLINICAL_NOTES_PROMPT: &str = "You are a clinical documentation assistant. From the \
consultation transcript provided by the user, write a structured clinical note in SOAP format \
(Subjective, Objective, Assessment, Plan). Be concise and factual; include only information \
present in the transcript.";

/// System prompt for the patient-summary completion.
pub const PATIENT_SUMMARY_PROMPT: &str = "You are a patient communication assistant. From the \
consultation transcript provided by the user, write a short, friendly summary addressed to the \
patient: what was discussed, what was decided, and what the patient should do next. Avoid \
medical jargon.";

/// Fixed refusal emitted by the chat assistant for out-of-scope questions.
pub const CHAT_REFUSAL: &str =
    "I can only answer questions about this summary. Please ask your care team about anything else.";

/// Build the system prompt that scopes the chat assistant to one summary.
pub fn chat_system_prompt(summary_text: &str) -> String {
    format!(
        "You are a helpful assistant answering a patient's questions about their medical \
         summary. Answer ONLY from the summary text between the markers below. If the answer \
         is not in the summary, reply exactly: \"{CHAT_REFUSAL}\" Do not give medical advice \
         beyond what the summary states.\n\n--- SUMMARY START ---\n{summary_text}\n--- SUMMARY END ---"
    )
}

/// Three-tier template lookup: inline custom → saved custom template →
/// named preset from settings → hardcoded default.
pub fn resolve_template(
    conn: &Connection,
    user_id: &Uuid,
    inline: Option<&str>,
) -> Result<String, DatabaseError> {
    if let Some(template) = inline {
        if !template.trim().is_empty() {
            return Ok(template.to_string());
        }
    }

    if let Some(custom) = get_custom_template(conn, user_id)? {
        return Ok(custom);
    }

    let settings = get_settings(conn, user_id)?;
    if let Some(name) = settings.template_preset {
        if let Some(preset) = get_preset(conn, &name)? {
            return Ok(preset.instructions);
        }
        tracing::warn!(preset = %name, "Configured template preset not found, using default");
    }

    Ok(DEFAULT_SUMMARY_TEMPLATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_user, upsert_custom_template, upsert_settings};
    use crate::db::sqlite::open_memory_database;
    use crate::models::UserSettings;

    fn seeded() -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        insert_user(&conn, &user_id, "dr@clinic.example", "hash").unwrap();
        (conn, user_id)
    }

    #[test]
    fn inline_template_wins() {
        let (conn, user_id) = seeded();
        upsert_custom_template(&conn, &user_id, "saved custom").unwrap();

        let resolved = resolve_template(&conn, &user_id, Some("inline wins")).unwrap();
        assert_eq!(resolved, "inline wins");
    }

    #[test]
    fn blank_inline_falls_through() {
        let (conn, user_id) = seeded();
        upsert_custom_template(&conn, &user_id, "saved custom").unwrap();

        let resolved = resolve_template(&conn, &user_id, Some("   ")).unwrap();
        assert_eq!(resolved, "saved custom");
    }

    #[test]
    fn preset_from_settings_used_when_no_custom() {
        let (conn, user_id) = seeded();
        upsert_settings(
            &conn,
            &user_id,
            &UserSettings {
                template_preset: Some("simple_language".into()),
                retention_days: 90,
            },
        )
        .unwrap();

        let resolved = resolve_template(&conn, &user_id, None).unwrap();
        assert!(resolved.contains("primary-school reading level"));
    }

    #[test]
    fn unknown_preset_falls_back_to_default() {
        let (conn, user_id) = seeded();
        upsert_settings(
            &conn,
            &user_id,
            &UserSettings {
                template_preset: Some("deleted_preset".into()),
                retention_days: 90,
            },
        )
        .unwrap();

        let resolved = resolve_template(&conn, &user_id, None).unwrap();
        assert_eq!(resolved, DEFAULT_SUMMARY_TEMPLATE);
    }

    #[test]
    fn default_when_nothing_configured() {
        let (conn, user_id) = seeded();
        let resolved = resolve_template(&conn, &user_id, None).unwrap();
        assert_eq!(resolved, DEFAULT_SUMMARY_TEMPLATE);
    }

    #[test]
    fn chat_prompt_embeds_summary_and_refusal() {
        let prompt = chat_system_prompt("You were treated for a sprain.");
        assert!(prompt.contains("You were treated for a sprain."));
        assert!(prompt.contains(CHAT_REFUSAL));
    }
}
