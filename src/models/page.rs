use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{is_reserved_slug, Record};
use crate::error::{CmsError, Result};

pub const PAGE_TEMPLATES: &[&str] = &["default", "full-width", "landing"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_status")]
    pub status: String, // published, draft
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub author: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn default_template() -> String {
    "default".to_string()
}

fn default_status() -> String {
    "draft".to_string()
}

impl Record for Page {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Page {
    pub fn is_published(&self) -> bool {
        self.status == "published"
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PageForm {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl PageForm {
    pub fn validate(&self) -> Result<()> {
        let mut fields = Vec::new();
        if self.title.trim().is_empty() {
            fields.push("title".to_string());
        }
        if let Some(t) = &self.template {
            if !PAGE_TEMPLATES.contains(&t.as_str()) {
                fields.push("template".to_string());
            }
        }
        if let Some(s) = &self.status {
            if s != "published" && s != "draft" {
                fields.push("status".to_string());
            }
        }
        if !fields.is_empty() {
            return Err(CmsError::invalid_fields("Invalid page data", fields));
        }
        let wanted = if self.slug.trim().is_empty() {
            slug::slugify(&self.title)
        } else {
            slug::slugify(&self.slug)
        };
        if is_reserved_slug(&wanted) {
            return Err(CmsError::invalid_fields(
                format!("The slug '{}' is reserved", wanted),
                vec!["slug".to_string()],
            ));
        }
        Ok(())
    }
}
