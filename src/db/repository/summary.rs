use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_timestamp, parse_timestamp_opt, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{ChatTurn, Summary};

const SUMMARY_COLUMNS: &str = "id, user_id, patient_name, original_filename, generated_text,
     patient_email, sent_at, follow_up_sent_at, chat_transcript, created_at";

pub fn insert_summary(conn: &Connection, summary: &Summary) -> Result<(), DatabaseError> {
    let transcript = serde_json::to_string(&summary.chat_transcript).map_err(|e| {
        DatabaseError::InvalidField {
            field: "summaries.chat_transcript".into(),
            value: e.to_string(),
        }
    })?;

    conn.execute(
        "INSERT INTO summaries (id, user_id, patient_name, original_filename, generated_text,
         patient_email, sent_at, follow_up_sent_at, chat_transcript, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            summary.id.to_string(),
            summary.user_id.to_string(),
            summary.patient_name,
            summary.original_filename,
            summary.generated_text,
            summary.patient_email,
            summary.sent_at.map(|t| t.to_rfc3339()),
            summary.follow_up_sent_at.map(|t| t.to_rfc3339()),
            transcript,
            summary.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_summary(conn: &Connection, id: &Uuid) -> Result<Option<Summary>, DatabaseError> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM summaries WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], row_to_parts);

    match result {
        Ok(parts) => Ok(Some(summary_from_parts(parts)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_summaries(conn: &Connection, user_id: &Uuid) -> Result<Vec<Summary>, DatabaseError> {
    let sql = format!(
        "SELECT {SUMMARY_COLUMNS} FROM summaries WHERE user_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], row_to_parts)?;

    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(summary_from_parts(row?)?);
    }
    Ok(summaries)
}

/// Delete a summary, scoped to its owner. Returns `false` if no row matched.
pub fn delete_summary(conn: &Connection, user_id: &Uuid, id: &Uuid) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM summaries WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(affected > 0)
}

pub fn set_summary_sent(
    conn: &Connection,
    id: &Uuid,
    patient_email: &str,
    sent_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE summaries SET patient_email = ?2, sent_at = ?3 WHERE id = ?1",
        params![id.to_string(), patient_email, sent_at.to_rfc3339()],
    )?;
    Ok(())
}

pub fn set_summary_follow_up(
    conn: &Connection,
    id: &Uuid,
    sent_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE summaries SET follow_up_sent_at = ?2 WHERE id = ?1",
        params![id.to_string(), sent_at.to_rfc3339()],
    )?;
    Ok(())
}

/// Replace the stored chat transcript. Callers only ever append turns to
/// the sequence they read.
pub fn set_chat_transcript(
    conn: &Connection,
    id: &Uuid,
    transcript: &[ChatTurn],
) -> Result<(), DatabaseError> {
    let json = serde_json::to_string(transcript).map_err(|e| DatabaseError::InvalidField {
        field: "summaries.chat_transcript".into(),
        value: e.to_string(),
    })?;
    conn.execute(
        "UPDATE summaries SET chat_transcript = ?2 WHERE id = ?1",
        params![id.to_string(), json],
    )?;
    Ok(())
}

/// Retention sweep: drop summaries created before the cutoff. Returns the
/// number of rows removed.
pub fn delete_summaries_older_than(
    conn: &Connection,
    user_id: &Uuid,
    cutoff: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM summaries WHERE user_id = ?1 AND created_at < ?2",
        params![user_id.to_string(), cutoff.to_rfc3339()],
    )?;
    Ok(affected)
}

type SummaryParts = (
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn row_to_parts(row: &rusqlite::Row<'_>) -> Result<SummaryParts, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn summary_from_parts(parts: SummaryParts) -> Result<Summary, DatabaseError> {
    let (id, user_id, patient_name, original_filename, generated_text, patient_email, sent_at, follow_up_sent_at, transcript, created_at) =
        parts;

    let chat_transcript: Vec<ChatTurn> =
        serde_json::from_str(&transcript).map_err(|_| DatabaseError::InvalidField {
            field: "summaries.chat_transcript".into(),
            value: transcript,
        })?;

    Ok(Summary {
        id: parse_uuid("summaries.id", &id)?,
        user_id: parse_uuid("summaries.user_id", &user_id)?,
        patient_name,
        original_filename,
        generated_text,
        patient_email,
        sent_at: parse_timestamp_opt("summaries.sent_at", sent_at)?,
        follow_up_sent_at: parse_timestamp_opt("summaries.follow_up_sent_at", follow_up_sent_at)?,
        chat_transcript,
        created_at: parse_timestamp("summaries.created_at", &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;

    pub(crate) fn make_summary(user_id: Uuid) -> Summary {
        Summary {
            id: Uuid::new_v4(),
            user_id,
            patient_name: "Alex Moreau".into(),
            original_filename: Some("discharge.pdf".into()),
            generated_text: "You were treated for a mild infection.".into(),
            patient_email: None,
            sent_at: None,
            follow_up_sent_at: None,
            chat_transcript: vec![],
            created_at: Utc::now(),
        }
    }

    fn seeded() -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        insert_user(&conn, &user_id, "dr@clinic.example", "hash").unwrap();
        (conn, user_id)
    }

    #[test]
    fn insert_and_get_round_trip() {
        let (conn, user_id) = seeded();
        let summary = make_summary(user_id);
        insert_summary(&conn, &summary).unwrap();

        let loaded = get_summary(&conn, &summary.id).unwrap().unwrap();
        assert_eq!(loaded.patient_name, "Alex Moreau");
        assert_eq!(loaded.generated_text, summary.generated_text);
        assert!(loaded.sent_at.is_none());
        assert!(loaded.chat_transcript.is_empty());
    }

    #[test]
    fn get_missing_returns_none() {
        let (conn, _) = seeded();
        assert!(get_summary(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn delete_is_owner_scoped() {
        let (conn, user_id) = seeded();
        let other = Uuid::new_v4();
        insert_user(&conn, &other, "other@clinic.example", "hash2").unwrap();

        let summary = make_summary(user_id);
        insert_summary(&conn, &summary).unwrap();

        assert!(!delete_summary(&conn, &other, &summary.id).unwrap());
        assert!(get_summary(&conn, &summary.id).unwrap().is_some());

        assert!(delete_summary(&conn, &user_id, &summary.id).unwrap());
        assert!(get_summary(&conn, &summary.id).unwrap().is_none());
    }

    #[test]
    fn sent_timestamp_and_email_update() {
        let (conn, user_id) = seeded();
        let summary = make_summary(user_id);
        insert_summary(&conn, &summary).unwrap();

        let when = Utc::now();
        set_summary_sent(&conn, &summary.id, "patient@home.example", when).unwrap();

        let loaded = get_summary(&conn, &summary.id).unwrap().unwrap();
        assert_eq!(loaded.patient_email.as_deref(), Some("patient@home.example"));
        assert_eq!(loaded.sent_at.unwrap().timestamp(), when.timestamp());
    }

    #[test]
    fn chat_transcript_persists_in_order() {
        let (conn, user_id) = seeded();
        let summary = make_summary(user_id);
        insert_summary(&conn, &summary).unwrap();

        let turns = vec![
            ChatTurn::user("What does the infection mean?"),
            ChatTurn::assistant("Your summary says it was mild and treated."),
        ];
        set_chat_transcript(&conn, &summary.id, &turns).unwrap();

        let loaded = get_summary(&conn, &summary.id).unwrap().unwrap();
        assert_eq!(loaded.chat_transcript, turns);
    }

    #[test]
    fn retention_cutoff_only_removes_old_rows() {
        let (conn, user_id) = seeded();

        let mut old = make_summary(user_id);
        old.created_at = Utc::now() - chrono::Duration::days(120);
        insert_summary(&conn, &old).unwrap();

        let fresh = make_summary(user_id);
        insert_summary(&conn, &fresh).unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(90);
        let removed = delete_summaries_older_than(&conn, &user_id, cutoff).unwrap();
        assert_eq!(removed, 1);
        assert!(get_summary(&conn, &old.id).unwrap().is_none());
        assert!(get_summary(&conn, &fresh.id).unwrap().is_some());
    }
}
