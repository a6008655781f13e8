//! Periodic deletion of summaries and transcriptions past each user's
//! retention period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;

use crate::db::repository::{
    delete_summaries_older_than, delete_transcriptions_older_than, get_settings, list_user_ids,
};
use crate::db::DatabaseError;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
/// Shutdown poll granularity while waiting between sweeps.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delete everything older than each user's retention window. Returns
/// the total number of rows removed.
pub fn sweep_once(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut removed = 0;
    let now = Utc::now();

    for user_id in list_user_ids(conn)? {
        let settings = get_settings(conn, &user_id)?;
        let cutoff = now - chrono::Duration::days(i64::from(settings.retention_days));
        removed += delete_summaries_older_than(conn, &user_id, cutoff)?;
        removed += delete_transcriptions_older_than(conn, &user_id, cutoff)?;
    }

    Ok(removed)
}

/// Handle for the background sweep task.
pub struct RetentionSweeper {
    shutdown: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl RetentionSweeper {
    /// Spawn the sweep loop. The first sweep runs immediately.
    pub fn start(db: Arc<Mutex<Connection>>) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = tokio::spawn(async move {
            loop {
                if flag.load(Ordering::Relaxed) {
                    break;
                }

                let swept = {
                    match db.lock() {
                        Ok(conn) => sweep_once(&conn),
                        Err(_) => {
                            tracing::error!("Retention sweep skipped: database lock poisoned");
                            break;
                        }
                    }
                };
                match swept {
                    Ok(0) => tracing::debug!("Retention sweep: nothing to remove"),
                    Ok(removed) => tracing::info!(removed, "Retention sweep removed old records"),
                    Err(e) => tracing::error!(error = %e, "Retention sweep failed"),
                }

                // Sleep in short steps so shutdown is picked up promptly.
                let mut waited = Duration::ZERO;
                while waited < SWEEP_INTERVAL && !flag.load(Ordering::Relaxed) {
                    tokio::time::sleep(POLL_INTERVAL).await;
                    waited += POLL_INTERVAL;
                }
            }
            tracing::debug!("Retention sweeper stopped");
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    use crate::db::repository::{insert_summary, insert_transcription, insert_user, upsert_settings};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Summary, Transcription, UserSettings};

    fn summary_aged(user_id: Uuid, days_old: i64) -> Summary {
        Summary {
            id: Uuid::new_v4(),
            user_id,
            patient_name: "Alex".into(),
            original_filename: None,
            generated_text: "text".into(),
            patient_email: None,
            sent_at: None,
            follow_up_sent_at: None,
            chat_transcript: vec![],
            created_at: Utc::now() - ChronoDuration::days(days_old),
        }
    }

    fn transcription_aged(user_id: Uuid, days_old: i64) -> Transcription {
        Transcription {
            id: Uuid::new_v4(),
            user_id,
            patient_name: "Alex".into(),
            patient_email: None,
            audio_duration_secs: None,
            transcript: None,
            clinical_notes: None,
            patient_summary: None,
            sent_at: None,
            created_at: Utc::now() - ChronoDuration::days(days_old),
        }
    }

    #[test]
    fn sweep_respects_per_user_retention() {
        let conn = open_memory_database().unwrap();

        let short = Uuid::new_v4();
        insert_user(&conn, &short, "short@clinic.example", "h1").unwrap();
        upsert_settings(
            &conn,
            &short,
            &UserSettings {
                template_preset: None,
                retention_days: 30,
            },
        )
        .unwrap();

        let long = Uuid::new_v4();
        insert_user(&conn, &long, "long@clinic.example", "h2").unwrap();

        // 60 days old: past the short user's 30-day window, within the
        // long user's default 90.
        insert_summary(&conn, &summary_aged(short, 60)).unwrap();
        insert_summary(&conn, &summary_aged(long, 60)).unwrap();
        insert_transcription(&conn, &transcription_aged(short, 60)).unwrap();

        let removed = sweep_once(&conn).unwrap();
        assert_eq!(removed, 2);

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn sweep_on_empty_database_is_a_noop() {
        let conn = open_memory_database().unwrap();
        assert_eq!(sweep_once(&conn).unwrap(), 0);
    }

    #[tokio::test]
    async fn sweeper_stops_on_shutdown() {
        let conn = open_memory_database().unwrap();
        let db = Arc::new(Mutex::new(conn));
        let sweeper = RetentionSweeper::start(db);
        sweeper.stop().await;
    }
}
