use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_timestamp, parse_timestamp_opt, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Transcription;

const TRANSCRIPTION_COLUMNS: &str = "id, user_id, patient_name, patient_email, audio_duration_secs,
     transcript, clinical_notes, patient_summary, sent_at, created_at";

pub fn insert_transcription(
    conn: &Connection,
    transcription: &Transcription,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO transcriptions (id, user_id, patient_name, patient_email, audio_duration_secs,
         transcript, clinical_notes, patient_summary, sent_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            transcription.id.to_string(),
            transcription.user_id.to_string(),
            transcription.patient_name,
            transcription.patient_email,
            transcription.audio_duration_secs,
            transcription.transcript,
            transcription.clinical_notes,
            transcription.patient_summary,
            transcription.sent_at.map(|t| t.to_rfc3339()),
            transcription.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_transcription(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Transcription>, DatabaseError> {
    let sql = format!("SELECT {TRANSCRIPTION_COLUMNS} FROM transcriptions WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], row_to_parts);

    match result {
        Ok(parts) => Ok(Some(transcription_from_parts(parts)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_transcriptions(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Transcription>, DatabaseError> {
    let sql = format!(
        "SELECT {TRANSCRIPTION_COLUMNS} FROM transcriptions WHERE user_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], row_to_parts)?;

    let mut transcriptions = Vec::new();
    for row in rows {
        transcriptions.push(transcription_from_parts(row?)?);
    }
    Ok(transcriptions)
}

pub fn delete_transcription(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM transcriptions WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(affected > 0)
}

/// First async fill step: the speech-to-text result.
pub fn set_transcript(
    conn: &Connection,
    id: &Uuid,
    transcript: &str,
    audio_duration_secs: Option<f64>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE transcriptions SET transcript = ?2, audio_duration_secs = COALESCE(?3, audio_duration_secs)
         WHERE id = ?1",
        params![id.to_string(), transcript, audio_duration_secs],
    )?;
    Ok(())
}

/// Second async fill step: both derived texts land in a single update.
pub fn set_clinical_notes(
    conn: &Connection,
    id: &Uuid,
    clinical_notes: &str,
    patient_summary: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE transcriptions SET clinical_notes = ?2, patient_summary = ?3 WHERE id = ?1",
        params![id.to_string(), clinical_notes, patient_summary],
    )?;
    Ok(())
}

pub fn set_transcription_sent(
    conn: &Connection,
    id: &Uuid,
    patient_email: &str,
    sent_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE transcriptions SET patient_email = ?2, sent_at = ?3 WHERE id = ?1",
        params![id.to_string(), patient_email, sent_at.to_rfc3339()],
    )?;
    Ok(())
}

pub fn delete_transcriptions_older_than(
    conn: &Connection,
    user_id: &Uuid,
    cutoff: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM transcriptions WHERE user_id = ?1 AND created_at < ?2",
        params![user_id.to_string(), cutoff.to_rfc3339()],
    )?;
    Ok(affected)
}

type TranscriptionParts = (
    String,
    String,
    String,
    Option<String>,
    Option<f64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn row_to_parts(row: &rusqlite::Row<'_>) -> Result<TranscriptionParts, rusqlite::Error> {
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

fn transcription_from_parts(parts: TranscriptionParts) -> Result<Transcription, DatabaseError> {
    let (id, user_id, patient_name, patient_email, audio_duration_secs, transcript, clinical_notes, patient_summary, sent_at, created_at) =
        parts;

    Ok(Transcription {
        id: parse_uuid("transcriptions.id", &id)?,
        user_id: parse_uuid("transcriptions.user_id", &user_id)?,
        patient_name,
        patient_email,
        audio_duration_secs,
        transcript,
        clinical_notes,
        patient_summary,
        sent_at: parse_timestamp_opt("transcriptions.sent_at", sent_at)?,
        created_at: parse_timestamp("transcriptions.created_at", &created_at)?,
    })
}
