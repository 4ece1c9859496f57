use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::error::{CmsError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Category name. Empty means uncategorized.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_status")]
    pub status: String, // published, draft
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn default_status() -> String {
    "draft".to_string()
}

impl Record for BlogPost {
    fn id(&self) -> i64 {
        self.id
    }
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == "published"
    }

    /// Sort key for newest-first listings.
    pub fn sort_date(&self) -> NaiveDateTime {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn in_category(&self, name: &str) -> bool {
        !self.category.is_empty() && self.category.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BlogPostForm {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: String,
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl BlogPostForm {
    pub fn validate(&self) -> Result<()> {
        let mut fields = Vec::new();
        if self.title.trim().is_empty() {
            fields.push("title".to_string());
        }
        if let Some(s) = &self.status {
            if s != "published" && s != "draft" {
                fields.push("status".to_string());
            }
        }
        if let Some(p) = &self.published_at {
            if !p.trim().is_empty() && super::parse_datetime(p).is_none() {
                fields.push("published_at".to_string());
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(CmsError::invalid_fields("Invalid post data", fields))
        }
    }

    pub fn tag_list(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for t in self.tags.split(',') {
            let t = t.trim();
            if !t.is_empty() && !tags.iter().any(|x| x.eq_ignore_ascii_case(t)) {
                tags.push(t.to_string());
            }
        }
        tags
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BlogCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Record for BlogCategory {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Category as shown in listings: stored categories plus names that only
/// appear on posts (`id` is `None` for those).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategoryCount {
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub count: usize,
}

/// Count posts per category, including orphan names that exist only on posts.
pub fn category_counts(categories: &[BlogCategory], posts: &[BlogPost]) -> Vec<CategoryCount> {
    let mut out: Vec<CategoryCount> = categories
        .iter()
        .map(|c| CategoryCount {
            id: Some(c.id),
            name: c.name.clone(),
            slug: c.slug.clone(),
            count: posts.iter().filter(|p| p.in_category(&c.name)).count(),
        })
        .collect();

    for post in posts {
        if post.category.is_empty() {
            continue;
        }
        match out
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&post.category))
        {
            Some(_) => {}
            None => out.push(CategoryCount {
                id: None,
                name: post.category.clone(),
                slug: slug::slugify(&post.category),
                count: posts.iter().filter(|p| p.in_category(&post.category)).count(),
            }),
        }
    }

    out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    out
}
