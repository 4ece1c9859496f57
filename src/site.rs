use chrono::Datelike;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::menu::{resolve_items, ResolvedMenuItem};
use crate::models::now;
use crate::models::page::Page;
use crate::store::Store;

pub const MENU_LOCATIONS: &[&str] = &["primary", "footer"];

/// Configured home page id, if set.
pub fn home_page_id(store: &dyn Store) -> Option<i64> {
    Some(store.setting_get_i64("home_page_id")).filter(|id| *id > 0)
}

/// The page served at `/`: the configured home page when it is published,
/// otherwise the first published page by sort order.
pub fn home_page(store: &dyn Store) -> Option<Page> {
    if let Some(page) = home_page_id(store)
        .and_then(|id| store.page_find_by_id(id))
        .filter(Page::is_published)
    {
        return Some(page);
    }
    store.page_list(Some("published")).into_iter().next()
}

/// Id of the page actually served at `/`, fallback included.
pub fn effective_home_id(store: &dyn Store) -> Option<i64> {
    home_page(store).map(|p| p.id)
}

/// Public URL of a page.
pub fn page_path(store: &dyn Store, page: &Page) -> String {
    if effective_home_id(store) == Some(page.id) {
        "/".to_string()
    } else {
        format!("/{}", page.slug)
    }
}

pub fn resolved_menu(store: &dyn Store, location: &str, current_path: &str) -> Vec<ResolvedMenuItem> {
    let Some(menu) = store.menu_find_by_location(location) else {
        return Vec::new();
    };
    let pages = store.page_list(Some("published"));
    resolve_items(&menu.items, &pages, effective_home_id(store), current_path)
}

/// Context shared by every public template.
pub fn base_context(store: &dyn Store, current_path: &str) -> Value {
    let menus: serde_json::Map<String, Value> = MENU_LOCATIONS
        .iter()
        .map(|loc| {
            (
                loc.to_string(),
                json!(resolved_menu(store, loc, current_path)),
            )
        })
        .collect();
    json!({
        "settings": store.setting_all(),
        "menus": menus,
        "current_path": current_path,
        "year": now().year(),
    })
}

/// Merge page-specific keys into the base context.
pub fn context(store: &dyn Store, current_path: &str, extra: Value) -> Value {
    let mut ctx = base_context(store, current_path);
    if let (Some(base), Value::Object(extra)) = (ctx.as_object_mut(), extra) {
        for (k, v) in extra {
            base.insert(k, v);
        }
    }
    ctx
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Pagination {
    pub current: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    #[serde(skip)]
    pub offset: usize,
    #[serde(skip)]
    pub per_page: usize,
}

/// 1-based pagination. Out-of-range pages clamp to the last page.
pub fn paginate(total: usize, per_page: usize, page: Option<usize>) -> Pagination {
    let per_page = per_page.max(1);
    let total_pages = total.div_ceil(per_page).max(1);
    let current = page.unwrap_or(1).clamp(1, total_pages);
    Pagination {
        current,
        total_pages,
        has_prev: current > 1,
        has_next: current < total_pages,
        offset: (current - 1) * per_page,
        per_page,
    }
}
