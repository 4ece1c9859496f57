use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::models::blog::{BlogCategory, BlogPost, BlogPostForm};
use crate::models::draft::PageDraft;
use crate::models::event::{Event, EventForm};
use crate::models::form::{FormDefinition, FormDefinitionForm, FormSubmission};
use crate::models::history::PageHistoryEntry;
use crate::models::log::{LogEntry, NewLogEntry};
use crate::models::media::MediaItem;
use crate::models::menu::{Menu, MenuForm};
use crate::models::page::{Page, PageForm};
use crate::models::user::{Session, User, UserForm};

pub mod files;
pub mod json;

pub use json::JsonStore;

/// Unified data-access trait. Every read and write of site content goes
/// through here. Implementation: `JsonStore` (one JSON document per entity).
///
/// Lookups return `Option`/`Vec` and treat an unreadable document as empty;
/// writes return `Result` so failures reach the caller.
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn seed_defaults(&self) -> Result<()>;
    fn storage_bytes(&self) -> u64;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_bool(&self, key: &str) -> bool {
        self.setting_get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<()>;
    fn setting_set_many(&self, settings: &HashMap<String, String>) -> Result<()>;
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_username(&self, username: &str) -> Option<User>;
    fn user_list(&self) -> Vec<User>;
    fn user_count(&self) -> usize;
    fn user_create(&self, form: &UserForm, password_hash: &str) -> Result<User>;
    fn user_update(&self, id: i64, form: &UserForm) -> Result<User>;
    fn user_update_password(&self, id: i64, password_hash: &str) -> Result<()>;
    fn user_touch_last_login(&self, id: i64) -> Result<()>;
    fn user_delete(&self, id: i64) -> Result<User>;

    // ── Sessions ────────────────────────────────────────────────────
    fn session_create(&self, session: Session) -> Result<()>;
    fn session_get_user(&self, session_id: &str) -> Option<User>;
    fn session_delete(&self, session_id: &str) -> Result<()>;
    fn session_cleanup_expired(&self) -> Result<usize>;

    // ── Pages ───────────────────────────────────────────────────────
    fn page_find_by_id(&self, id: i64) -> Option<Page>;
    fn page_find_by_slug(&self, slug: &str) -> Option<Page>;
    fn page_list(&self, status: Option<&str>) -> Vec<Page>;
    fn page_count(&self, status: Option<&str>) -> usize;
    fn page_create(&self, form: &PageForm, user: &str) -> Result<Page>;
    fn page_update(&self, id: i64, form: &PageForm, user: &str) -> Result<Page>;
    fn page_set_content(&self, id: i64, content: &str, user: &str) -> Result<Page>;
    fn page_delete(&self, id: i64, user: &str) -> Result<Page>;

    // ── Page history ────────────────────────────────────────────────
    fn page_history(&self, page_id: i64) -> Vec<PageHistoryEntry>;
    fn page_history_get(&self, id: i64) -> Option<PageHistoryEntry>;
    fn page_restore(&self, history_id: i64, user: &str) -> Result<Page>;

    // ── Drafts ──────────────────────────────────────────────────────
    fn draft_get(&self, page_id: i64) -> Option<PageDraft>;
    fn draft_save(&self, page_id: i64, content: &str, user: &str) -> Result<PageDraft>;
    fn draft_discard(&self, page_id: i64) -> Result<bool>;

    // ── Blog posts ──────────────────────────────────────────────────
    fn post_find_by_id(&self, id: i64) -> Option<BlogPost>;
    fn post_find_by_slug(&self, slug: &str) -> Option<BlogPost>;
    fn post_list(&self, status: Option<&str>, category: Option<&str>) -> Vec<BlogPost>;
    fn post_count(&self, status: Option<&str>) -> usize;
    fn post_create(&self, form: &BlogPostForm, author: &str) -> Result<BlogPost>;
    fn post_update(&self, id: i64, form: &BlogPostForm) -> Result<BlogPost>;
    fn post_delete(&self, id: i64) -> Result<BlogPost>;

    // ── Blog categories ─────────────────────────────────────────────
    fn category_list(&self) -> Vec<BlogCategory>;
    fn category_find_by_id(&self, id: i64) -> Option<BlogCategory>;
    fn category_find_by_slug(&self, slug: &str) -> Option<BlogCategory>;
    fn category_create(&self, name: &str) -> Result<BlogCategory>;
    /// Returns the number of posts moved to the new name.
    fn category_rename(&self, id: i64, name: &str) -> Result<usize>;
    /// Returns the number of posts that became uncategorized.
    fn category_delete(&self, id: i64) -> Result<usize>;

    // ── Events ──────────────────────────────────────────────────────
    fn event_find_by_id(&self, id: i64) -> Option<Event>;
    fn event_find_by_slug(&self, slug: &str) -> Option<Event>;
    fn event_list(&self) -> Vec<Event>;
    fn event_upcoming(&self, now: NaiveDateTime, limit: usize) -> Vec<Event>;
    fn event_count(&self) -> usize;
    fn event_create(&self, form: &EventForm) -> Result<Event>;
    fn event_update(&self, id: i64, form: &EventForm) -> Result<Event>;
    fn event_delete(&self, id: i64) -> Result<Event>;

    // ── Menus ───────────────────────────────────────────────────────
    fn menu_find_by_id(&self, id: i64) -> Option<Menu>;
    fn menu_find_by_location(&self, location: &str) -> Option<Menu>;
    fn menu_list(&self) -> Vec<Menu>;
    fn menu_create(&self, form: &MenuForm) -> Result<Menu>;
    fn menu_update(&self, id: i64, form: &MenuForm) -> Result<Menu>;
    fn menu_delete(&self, id: i64) -> Result<Menu>;

    // ── Forms ───────────────────────────────────────────────────────
    fn form_find_by_id(&self, id: i64) -> Option<FormDefinition>;
    fn form_find_by_slug(&self, slug: &str) -> Option<FormDefinition>;
    fn form_list(&self) -> Vec<FormDefinition>;
    fn form_create(&self, form: &FormDefinitionForm) -> Result<FormDefinition>;
    fn form_update(&self, id: i64, form: &FormDefinitionForm) -> Result<FormDefinition>;
    /// Also deletes the form's submissions; returns how many went with it.
    fn form_delete(&self, id: i64) -> Result<(FormDefinition, usize)>;

    // ── Form submissions ────────────────────────────────────────────
    fn submission_create(
        &self,
        form_id: i64,
        data: BTreeMap<String, String>,
        ip: Option<&str>,
    ) -> Result<FormSubmission>;
    fn submission_find_by_id(&self, id: i64) -> Option<FormSubmission>;
    fn submission_list(&self, form_id: Option<i64>) -> Vec<FormSubmission>;
    fn submission_count(&self, form_id: Option<i64>, unread_only: bool) -> usize;
    fn submission_mark_read(&self, id: i64) -> Result<()>;
    fn submission_delete(&self, id: i64) -> Result<()>;

    // ── Media ───────────────────────────────────────────────────────
    fn media_list(&self) -> Vec<MediaItem>;
    fn media_find_by_id(&self, id: i64) -> Option<MediaItem>;
    fn media_create(
        &self,
        filename: &str,
        original_name: &str,
        mime: &str,
        size: u64,
    ) -> Result<MediaItem>;
    fn media_update_alt(&self, id: i64, alt: &str) -> Result<MediaItem>;
    /// Removes the record only; the caller deletes the file.
    fn media_delete(&self, id: i64) -> Result<MediaItem>;

    // ── Activity log ────────────────────────────────────────────────
    /// Best effort: failures are logged, never returned.
    fn log_record(&self, entry: NewLogEntry);
    fn log_list(
        &self,
        action: Option<&str>,
        entity_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<LogEntry>;
    fn log_count(&self, action: Option<&str>, entity_type: Option<&str>) -> usize;
    fn log_clear(&self) -> Result<usize>;
}
