use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{TemplatePreset, UserSettings};

pub fn list_presets(conn: &Connection) -> Result<Vec<TemplatePreset>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name, instructions FROM template_presets ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(TemplatePreset {
            name: row.get(0)?,
            instructions: row.get(1)?,
        })
    })?;

    let mut presets = Vec::new();
    for row in rows {
        presets.push(row?);
    }
    Ok(presets)
}

pub fn get_preset(conn: &Connection, name: &str) -> Result<Option<TemplatePreset>, DatabaseError> {
    let preset = conn
        .query_row(
            "SELECT name, instructions FROM template_presets WHERE name = ?1",
            params![name],
            |row| {
                Ok(TemplatePreset {
                    name: row.get(0)?,
                    instructions: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(preset)
}

pub fn get_custom_template(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<String>, DatabaseError> {
    let instructions = conn
        .query_row(
            "SELECT instructions FROM user_custom_templates WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(instructions)
}

pub fn upsert_custom_template(
    conn: &Connection,
    user_id: &Uuid,
    instructions: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_custom_templates (user_id, instructions, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET instructions = ?2, updated_at = ?3",
        params![user_id.to_string(), instructions, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Settings for a user, falling back to defaults when no row exists.
pub fn get_settings(conn: &Connection, user_id: &Uuid) -> Result<UserSettings, DatabaseError> {
    let settings = conn
        .query_row(
            "SELECT template_preset, retention_days FROM user_settings WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| {
                Ok(UserSettings {
                    template_preset: row.get(0)?,
                    retention_days: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(settings.unwrap_or_default())
}

pub fn upsert_settings(
    conn: &Connection,
    user_id: &Uuid,
    settings: &UserSettings,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_settings (user_id, template_preset, retention_days)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET template_preset = ?2, retention_days = ?3",
        params![
            user_id.to_string(),
            settings.template_preset,
            settings.retention_days
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RETENTION_DAYS;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;

    fn seeded() -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let user_id = Uuid::new_v4();
        insert_user(&conn, &user_id, "dr@clinic.example", "hash").unwrap();
        (conn, user_id)
    }

    #[test]
    fn seeded_presets_are_readable() {
        let (conn, _) = seeded();
        let presets = list_presets(&conn).unwrap();
        assert!(presets.iter().any(|p| p.name == "standard"));
        assert!(get_preset(&conn, "simple_language").unwrap().is_some());
        assert!(get_preset(&conn, "does_not_exist").unwrap().is_none());
    }

    #[test]
    fn custom_template_upsert_replaces() {
        let (conn, user_id) = seeded();
        assert!(get_custom_template(&conn, &user_id).unwrap().is_none());

        upsert_custom_template(&conn, &user_id, "first version").unwrap();
        upsert_custom_template(&conn, &user_id, "second version").unwrap();

        assert_eq!(
            get_custom_template(&conn, &user_id).unwrap().as_deref(),
            Some("second version")
        );
    }

    #[test]
    fn settings_default_until_written() {
        let (conn, user_id) = seeded();
        let settings = get_settings(&conn, &user_id).unwrap();
        assert_eq!(settings.retention_days, DEFAULT_RETENTION_DAYS);
        assert!(settings.template_preset.is_none());

        upsert_settings(
            &conn,
            &user_id,
            &UserSettings {
                template_preset: Some("detailed".into()),
                retention_days: 30,
            },
        )
        .unwrap();

        let settings = get_settings(&conn, &user_id).unwrap();
        assert_eq!(settings.template_preset.as_deref(), Some("detailed"));
        assert_eq!(settings.retention_days, 30);
    }
}
