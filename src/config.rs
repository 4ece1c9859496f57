use std::path::PathBuf;

use serde::Deserialize;

/// Application settings read from `Rocket.toml` (and `ROCKET_*` env vars).
/// Site-level options that editors change at runtime live in `settings.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub blocks_dir: PathBuf,
    pub admin_slug: String,
    pub initial_admin_password: String,
    pub history_limit: usize,
    pub log_limit: usize,
    pub undo_capacity: usize,
    pub undo_debounce_ms: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        CmsConfig {
            data_dir: PathBuf::from("website/data"),
            uploads_dir: PathBuf::from("website/uploads"),
            blocks_dir: PathBuf::from("website/blocks"),
            admin_slug: "admin".to_string(),
            initial_admin_password: "admin".to_string(),
            history_limit: 25,
            log_limit: 1000,
            undo_capacity: 50,
            undo_debounce_ms: 800,
        }
    }
}

impl CmsConfig {
    /// Clamp values that would make the store or builder misbehave.
    pub fn normalized(mut self) -> Self {
        self.history_limit = self.history_limit.max(1);
        self.log_limit = self.log_limit.max(10);
        self.undo_capacity = self.undo_capacity.max(2);
        let slug = self.admin_slug.trim_matches('/').to_string();
        self.admin_slug = if slug.is_empty() {
            "admin".to_string()
        } else {
            slug
        };
        self
    }
}
