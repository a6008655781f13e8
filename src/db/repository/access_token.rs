use rusqlite::{params, Connection};

use super::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::PatientAccessToken;

pub fn insert_access_token(
    conn: &Connection,
    token: &PatientAccessToken,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_access_tokens (token, summary_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            token.token,
            token.summary_id.to_string(),
            token.expires_at.to_rfc3339(),
            token.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_access_token(
    conn: &Connection,
    token: &str,
) -> Result<Option<PatientAccessToken>, DatabaseError> {
    let result = conn.query_row(
        "SELECT token, summary_id, expires_at, created_at
         FROM patient_access_tokens WHERE token = ?1",
        params![token],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((token, summary_id, expires_at, created_at)) => Ok(Some(PatientAccessToken {
            token,
            summary_id: parse_uuid("patient_access_tokens.summary_id", &summary_id)?,
            expires_at: parse_timestamp("patient_access_tokens.expires_at", &expires_at)?,
            created_at: parse_timestamp("patient_access_tokens.created_at", &created_at)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
