use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{parse_datetime, Record};
use crate::error::{CmsError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub starts_at: NaiveDateTime,
    #[serde(default)]
    pub ends_at: Option<NaiveDateTime>,
    #[serde(default = "default_status")]
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn default_status() -> String {
    "published".to_string()
}

impl Record for Event {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Event {
    /// Not yet over at `now`: either starts later or is still running.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.starts_at >= now || self.ends_at.map(|e| e >= now).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventForm {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EventForm {
    /// Validate and return the parsed `(starts_at, ends_at)`.
    pub fn validate(&self) -> Result<(NaiveDateTime, Option<NaiveDateTime>)> {
        let mut fields = Vec::new();
        if self.title.trim().is_empty() {
            fields.push("title".to_string());
        }
        let starts = parse_datetime(&self.starts_at);
        if starts.is_none() {
            fields.push("starts_at".to_string());
        }
        let ends = match self.ends_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => match parse_datetime(s) {
                Some(dt) => Some(dt),
                None => {
                    fields.push("ends_at".to_string());
                    None
                }
            },
        };
        if let Some(s) = &self.status {
            if s != "published" && s != "draft" {
                fields.push("status".to_string());
            }
        }
        if !fields.is_empty() {
            return Err(CmsError::invalid_fields("Invalid event data", fields));
        }
        let starts = starts.ok_or_else(|| CmsError::validation("starts_at is required"))?;
        if let Some(e) = ends {
            if e < starts {
                return Err(CmsError::invalid_fields(
                    "An event cannot end before it starts",
                    vec!["ends_at".to_string()],
                ));
            }
        }
        Ok((starts, ends))
    }
}
