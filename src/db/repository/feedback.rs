use rusqlite::{params, Connection};

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Feedback, GlobalStats};

pub fn insert_feedback(conn: &Connection, feedback: &Feedback) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO feedback (id, session_id, summary_id, ease_of_understanding, usefulness,
         clarity, trust, recommendation, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            feedback.id.to_string(),
            feedback.session_id,
            feedback.summary_id.map(|id| id.to_string()),
            feedback.ease_of_understanding,
            feedback.usefulness,
            feedback.clarity,
            feedback.trust,
            feedback.recommendation,
            feedback.comment,
            feedback.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_feedback_for_summary(
    conn: &Connection,
    summary_id: &uuid::Uuid,
) -> Result<Vec<Feedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, summary_id, ease_of_understanding, usefulness, clarity, trust,
         recommendation, comment, created_at
         FROM feedback WHERE summary_id = ?1 ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![summary_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<u8>>(3)?,
            row.get::<_, Option<u8>>(4)?,
            row.get::<_, Option<u8>>(5)?,
            row.get::<_, Option<u8>>(6)?,
            row.get::<_, Option<u8>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, String>(9)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, session_id, summary_id, ease, useful, clarity, trust, rec, comment, created_at) =
            row?;
        items.push(Feedback {
            id: parse_uuid("feedback.id", &id)?,
            session_id,
            summary_id: summary_id
                .map(|s| parse_uuid("feedback.summary_id", &s))
                .transpose()?,
            ease_of_understanding: ease,
            usefulness: useful,
            clarity,
            trust,
            recommendation: rec,
            comment,
            created_at: parse_timestamp("feedback.created_at", &created_at)?,
        });
    }
    Ok(items)
}

/// Aggregate counts for the public stats endpoint. One round trip.
pub fn global_stats(conn: &Connection) -> Result<GlobalStats, DatabaseError> {
    let stats = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM summaries),
            (SELECT COUNT(*) FROM transcriptions WHERE transcript IS NOT NULL),
            (SELECT COUNT(*) FROM feedback),
            (SELECT AVG(recommendation) FROM feedback WHERE recommendation IS NOT NULL)",
        [],
        |row| {
            Ok(GlobalStats {
                summaries_generated: row.get(0)?,
                transcriptions_processed: row.get(1)?,
                feedback_count: row.get(2)?,
                average_recommendation: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}
