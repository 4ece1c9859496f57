use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    #[serde(default)]
    pub user: Option<String>,
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub entity_title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Record for LogEntry {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Fields of a new log entry; id and timestamp are filled in by the store.
#[derive(Debug, Clone, Default)]
pub struct NewLogEntry {
    pub user: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub entity_title: Option<String>,
    pub details: Option<String>,
    pub ip: Option<String>,
}

impl NewLogEntry {
    pub fn new(user: &str, action: &str, entity_type: &str) -> Self {
        NewLogEntry {
            user: Some(user.to_string()),
            action: action.to_string(),
            entity_type: Some(entity_type.to_string()),
            ..Default::default()
        }
    }

    pub fn entity(mut self, id: i64, title: &str) -> Self {
        self.entity_id = Some(id);
        self.entity_title = Some(title.to_string());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn ip(mut self, ip: &str) -> Self {
        self.ip = Some(ip.to_string());
        self
    }
}
