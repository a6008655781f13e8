use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;

/// A clinician account. Bearer tokens are stored as SHA-256 hashes only.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

pub fn insert_user(conn: &Connection, id: &Uuid, email: &str, token_hash: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, token_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), email, token_hash, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Look up the account owning a presented bearer token, by token hash.
pub fn find_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, email FROM users WHERE token_hash = ?1",
        params![token_hash],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        },
    );

    match result {
        Ok((id, email)) => Ok(Some(User {
            id: parse_uuid("users.id", &id)?,
            email,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All account ids, for the retention sweep.
pub fn list_user_ids(conn: &Connection) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM users")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_uuid("users.id", &row?)?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn token_hash_lookup() {
        let conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        insert_user(&conn, &id, "dr@clinic.example", "hash-abc").unwrap();

        let user = find_user_by_token_hash(&conn, "hash-abc").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "dr@clinic.example");

        assert!(find_user_by_token_hash(&conn, "hash-xyz").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &Uuid::new_v4(), "dr@clinic.example", "h1").unwrap();
        let err = insert_user(&conn, &Uuid::new_v4(), "dr@clinic.example", "h2");
        assert!(err.is_err());
    }
}
