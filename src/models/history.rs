use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::page::Page;
use super::Record;

/// One snapshot in `page_history.json`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PageHistoryEntry {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub action: String, // create, update, builder, restore, delete
    #[serde(default)]
    pub user: String,
    pub created_at: NaiveDateTime,
}

impl Record for PageHistoryEntry {
    fn id(&self) -> i64 {
        self.id
    }
}

impl PageHistoryEntry {
    pub fn snapshot(id: i64, page: &Page, action: &str, user: &str, at: NaiveDateTime) -> Self {
        PageHistoryEntry {
            id,
            page_id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            content: page.content.clone(),
            action: action.to_string(),
            user: user.to_string(),
            created_at: at,
        }
    }
}

/// Drop the oldest entries of `page_id` until at most `limit` remain.
/// Entries are assumed to be in insertion order.
pub fn cap_history(entries: &mut Vec<PageHistoryEntry>, page_id: i64, limit: usize) {
    let count = entries.iter().filter(|e| e.page_id == page_id).count();
    if count <= limit {
        return;
    }
    let mut excess = count - limit;
    entries.retain(|e| {
        if excess > 0 && e.page_id == page_id {
            excess -= 1;
            false
        } else {
            true
        }
    });
}
