//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a `rusqlite::Connection`, one sub-module per table
//! group. Ownership scoping is explicit: anything a clinician can mutate
//! takes the owning `user_id` and the caller compares it against the
//! authenticated identity before writing.

mod access_token;
mod feedback;
mod summary;
mod template;
mod transcription;
mod user;

pub use access_token::*;
pub use feedback::*;
pub use summary::*;
pub use template::*;
pub use transcription::*;
pub use user::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        })
}

pub(crate) fn parse_timestamp_opt(
    field: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_timestamp(field, &v)).transpose()
}
