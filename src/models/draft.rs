use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Best-effort autosave written by the builder, one file per page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PageDraft {
    pub page_id: i64,
    pub content: String,
    #[serde(default)]
    pub user: String,
    pub saved_at: NaiveDateTime,
}

pub fn draft_file_name(page_id: i64) -> String {
    format!("drafts/page_{}.json", page_id)
}
