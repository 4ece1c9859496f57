use serde::{Deserialize, Serialize};

use super::page::Page;
use super::Record;
use crate::error::{CmsError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl Record for Menu {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MenuItem {
    pub label: String,
    /// Page id. Takes precedence over `url`.
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub children: Vec<MenuItem>,
}

fn default_target() -> String {
    "_self".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MenuForm {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl MenuForm {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CmsError::invalid_fields(
                "Menu name is required",
                vec!["name".to_string()],
            ));
        }
        fn check(items: &[MenuItem]) -> bool {
            items.iter().all(|i| {
                !i.label.trim().is_empty()
                    && (i.page.is_some() || i.url.as_deref().map(|u| !u.trim().is_empty()).unwrap_or(false))
                    && check(&i.children)
            })
        }
        if !check(&self.items) {
            return Err(CmsError::invalid_fields(
                "Every menu item needs a label and a page or URL",
                vec!["items".to_string()],
            ));
        }
        Ok(())
    }
}

/// Remove every item (and its subtree) that points at `page_id`.
/// Returns how many items were removed.
pub fn remove_page_refs(items: &mut Vec<MenuItem>, page_id: i64) -> usize {
    let before = items.len();
    items.retain(|i| i.page != Some(page_id));
    let mut removed = before - items.len();
    for item in items.iter_mut() {
        removed += remove_page_refs(&mut item.children, page_id);
    }
    removed
}

/// A menu item ready for templates.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResolvedMenuItem {
    pub label: String,
    pub href: String,
    pub target: String,
    pub active: bool,
    pub children: Vec<ResolvedMenuItem>,
}

/// Resolve page references to hrefs. Items pointing at missing or
/// unpublished pages are dropped along with their children.
pub fn resolve_items(
    items: &[MenuItem],
    pages: &[Page],
    home_page_id: Option<i64>,
    current_path: &str,
) -> Vec<ResolvedMenuItem> {
    items
        .iter()
        .filter_map(|item| {
            let href = match item.page {
                Some(pid) => {
                    let page = pages.iter().find(|p| p.id == pid && p.is_published())?;
                    if Some(page.id) == home_page_id {
                        "/".to_string()
                    } else {
                        format!("/{}", page.slug)
                    }
                }
                None => item.url.clone().unwrap_or_else(|| "#".to_string()),
            };
            Some(ResolvedMenuItem {
                label: item.label.clone(),
                active: href == current_path,
                target: item.target.clone(),
                children: resolve_items(&item.children, pages, home_page_id, current_path),
                href,
            })
        })
        .collect()
}
