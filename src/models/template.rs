use serde::{Deserialize, Serialize};

/// An admin-curated prompt string selectable by name to steer AI output
/// formatting. Seeded by migration, read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePreset {
    pub name: String,
    pub instructions: String,
}

/// Per-user preferences read by the generation endpoint and the
/// retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub template_preset: Option<String>,
    pub retention_days: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            template_preset: None,
            retention_days: crate::config::DEFAULT_RETENTION_DAYS,
        }
    }
}
