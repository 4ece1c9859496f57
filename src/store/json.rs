use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::files::JsonFiles;
use super::Store;
use crate::error::{CmsError, Result};
use crate::models::blog::{BlogCategory, BlogPost, BlogPostForm};
use crate::models::draft::{draft_file_name, PageDraft};
use crate::models::event::{Event, EventForm};
use crate::models::form::{FormDefinition, FormDefinitionForm, FormSubmission};
use crate::models::history::{cap_history, PageHistoryEntry};
use crate::models::log::{LogEntry, NewLogEntry};
use crate::models::media::MediaItem;
use crate::models::menu::{remove_page_refs, Menu, MenuForm};
use crate::models::page::{Page, PageForm};
use crate::models::settings::DEFAULT_SETTINGS;
use crate::models::user::{Session, User, UserForm};
use crate::models::{next_id, non_empty, now, parse_datetime, unique_slug};

const PAGES: &str = "pages.json";
const PAGE_HISTORY: &str = "page_history.json";
const POSTS: &str = "blog_posts.json";
const CATEGORIES: &str = "blog_categories.json";
const EVENTS: &str = "events.json";
const MENUS: &str = "menus.json";
const FORMS: &str = "forms.json";
const SUBMISSIONS: &str = "form_submissions.json";
const USERS: &str = "users.json";
const SESSIONS: &str = "sessions.json";
const MEDIA: &str = "media.json";
const SETTINGS: &str = "settings.json";
const LOGS: &str = "logs.json";

/// `Store` over flat JSON documents, one file per entity.
pub struct JsonStore {
    files: JsonFiles,
    history_limit: usize,
    log_limit: usize,
}

impl JsonStore {
    pub fn open(data_dir: impl Into<PathBuf>, history_limit: usize, log_limit: usize) -> Result<Self> {
        Ok(JsonStore {
            files: JsonFiles::new(data_dir)?,
            history_limit: history_limit.max(1),
            log_limit: log_limit.max(1),
        })
    }

    fn pages(&self) -> Vec<Page> {
        self.files.read_json_file_or_default(PAGES)
    }

    fn posts(&self) -> Vec<BlogPost> {
        self.files.read_json_file_or_default(POSTS)
    }

    fn settings_map(&self) -> BTreeMap<String, String> {
        self.files.read_json_file_or_default(SETTINGS)
    }

    fn append_history(&self, page: &Page, action: &str, user: &str) -> Result<()> {
        let mut history: Vec<PageHistoryEntry> = self.files.read_json_file(PAGE_HISTORY)?;
        let id = next_id(&history);
        history.push(PageHistoryEntry::snapshot(id, page, action, user, now()));
        cap_history(&mut history, page.id, self.history_limit);
        self.files.write_json_file(PAGE_HISTORY, &history)
    }

    /// Like `append_history`, but a failure only gets logged: the page write
    /// it follows has already succeeded.
    fn record_history(&self, page: &Page, action: &str, user: &str) {
        if let Err(e) = self.append_history(page, action, user) {
            log::error!("Failed to record history for page {}: {}", page.id, e);
        }
    }

    fn apply_page_form(page: &mut Page, form: &PageForm) {
        page.title = form.title.trim().to_string();
        page.content = form.content.clone();
        if let Some(t) = &form.template {
            page.template = t.clone();
        }
        if let Some(s) = &form.status {
            page.status = s.clone();
        }
        page.meta_title = non_empty(form.meta_title.clone());
        page.meta_description = non_empty(form.meta_description.clone());
        page.parent_id = form.parent_id.filter(|p| *p != page.id);
        if let Some(o) = form.sort_order {
            page.sort_order = o;
        }
    }

    fn apply_post_form(post: &mut BlogPost, form: &BlogPostForm) {
        post.title = form.title.trim().to_string();
        post.content = form.content.clone();
        post.excerpt = non_empty(form.excerpt.clone());
        post.category = form.category.trim().to_string();
        post.tags = form.tag_list();
        if let Some(s) = &form.status {
            post.status = s.clone();
        }
        post.featured_image = non_empty(form.featured_image.clone());
        if let Some(dt) = form.published_at.as_deref().and_then(parse_datetime) {
            post.published_at = Some(dt);
        }
        if post.is_published() && post.published_at.is_none() {
            post.published_at = Some(now());
        }
    }
}

impl Store for JsonStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn seed_defaults(&self) -> Result<()> {
        let mut settings: BTreeMap<String, String> = self.files.read_json_file(SETTINGS)?;
        let mut changed = false;
        for (key, value) in DEFAULT_SETTINGS {
            if !settings.contains_key(*key) {
                settings.insert(key.to_string(), value.to_string());
                changed = true;
            }
        }
        if changed {
            self.files.write_json_file(SETTINGS, &settings)?;
        }
        Ok(())
    }

    fn storage_bytes(&self) -> u64 {
        self.files.total_bytes()
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        self.settings_map().remove(key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<()> {
        let mut settings: BTreeMap<String, String> = self.files.read_json_file(SETTINGS)?;
        settings.insert(key.to_string(), value.to_string());
        self.files.write_json_file(SETTINGS, &settings)
    }

    fn setting_set_many(&self, values: &HashMap<String, String>) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut settings: BTreeMap<String, String> = self.files.read_json_file(SETTINGS)?;
        for (k, v) in values {
            settings.insert(k.clone(), v.clone());
        }
        self.files.write_json_file(SETTINGS, &settings)
    }

    fn setting_all(&self) -> HashMap<String, String> {
        self.settings_map().into_iter().collect()
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        self.user_list().into_iter().find(|u| u.id == id)
    }

    fn user_get_by_username(&self, username: &str) -> Option<User> {
        let username = username.trim();
        self.user_list()
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
    }

    fn user_list(&self) -> Vec<User> {
        self.files.read_json_file_or_default(USERS)
    }

    fn user_count(&self) -> usize {
        self.user_list().len()
    }

    fn user_create(&self, form: &UserForm, password_hash: &str) -> Result<User> {
        let mut users: Vec<User> = self.files.read_json_file(USERS)?;
        let username = form.username.trim();
        let email = form.email.trim();
        if users.iter().any(|u| u.username.eq_ignore_ascii_case(username)) {
            return Err(CmsError::conflict(format!("Username '{}' is taken", username)));
        }
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(CmsError::conflict(format!("Email '{}' is already in use", email)));
        }
        let user = User {
            id: next_id(&users),
            username: username.to_string(),
            email: email.to_string(),
            display_name: form.display_name.trim().to_string(),
            password_hash: password_hash.to_string(),
            role: form.role.clone(),
            status: form.status.clone(),
            last_login_at: None,
            created_at: now(),
        };
        users.push(user.clone());
        self.files.write_json_file(USERS, &users)?;
        Ok(user)
    }

    fn user_update(&self, id: i64, form: &UserForm) -> Result<User> {
        let mut users: Vec<User> = self.files.read_json_file(USERS)?;
        let username = form.username.trim();
        let email = form.email.trim();
        if users
            .iter()
            .any(|u| u.id != id && u.username.eq_ignore_ascii_case(username))
        {
            return Err(CmsError::conflict(format!("Username '{}' is taken", username)));
        }
        if users
            .iter()
            .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
        {
            return Err(CmsError::conflict(format!("Email '{}' is already in use", email)));
        }

        let other_active_admins = users
            .iter()
            .filter(|u| u.id != id && u.is_admin() && u.is_active())
            .count();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| CmsError::not_found("User not found"))?;
        let stays_active_admin = form.role == "admin" && form.status == "active";
        if user.is_admin() && user.is_active() && !stays_active_admin && other_active_admins == 0 {
            return Err(CmsError::conflict("The last active admin cannot be demoted or locked"));
        }

        user.username = username.to_string();
        user.email = email.to_string();
        user.display_name = form.display_name.trim().to_string();
        user.role = form.role.clone();
        user.status = form.status.clone();
        let updated = user.clone();
        self.files.write_json_file(USERS, &users)?;

        if !updated.is_active() {
            let mut sessions: Vec<Session> = self.files.read_json_file(SESSIONS)?;
            let before = sessions.len();
            sessions.retain(|s| s.user_id != id);
            if sessions.len() != before {
                self.files.write_json_file(SESSIONS, &sessions)?;
            }
        }
        Ok(updated)
    }

    fn user_update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let mut users: Vec<User> = self.files.read_json_file(USERS)?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| CmsError::not_found("User not found"))?;
        user.password_hash = password_hash.to_string();
        self.files.write_json_file(USERS, &users)
    }

    fn user_touch_last_login(&self, id: i64) -> Result<()> {
        let mut users: Vec<User> = self.files.read_json_file(USERS)?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(now());
            self.files.write_json_file(USERS, &users)?;
        }
        Ok(())
    }

    fn user_delete(&self, id: i64) -> Result<User> {
        let mut users: Vec<User> = self.files.read_json_file(USERS)?;
        let idx = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| CmsError::not_found("User not found"))?;
        let target = &users[idx];
        if target.is_admin()
            && target.is_active()
            && !users
                .iter()
                .any(|u| u.id != id && u.is_admin() && u.is_active())
        {
            return Err(CmsError::conflict("The last active admin cannot be deleted"));
        }
        let removed = users.remove(idx);
        self.files.write_json_file(USERS, &users)?;

        let mut sessions: Vec<Session> = self.files.read_json_file(SESSIONS)?;
        sessions.retain(|s| s.user_id != id);
        self.files.write_json_file(SESSIONS, &sessions)?;
        Ok(removed)
    }

    // ── Sessions ────────────────────────────────────────────────────

    fn session_create(&self, session: Session) -> Result<()> {
        let mut sessions: Vec<Session> = self.files.read_json_file(SESSIONS)?;
        let current = now();
        sessions.retain(|s| s.expires_at > current);
        sessions.push(session);
        self.files.write_json_file(SESSIONS, &sessions)
    }

    fn session_get_user(&self, session_id: &str) -> Option<User> {
        let sessions: Vec<Session> = self.files.read_json_file_or_default(SESSIONS);
        let session = sessions
            .into_iter()
            .find(|s| s.id == session_id && s.expires_at > now())?;
        self.user_get_by_id(session.user_id)
    }

    fn session_delete(&self, session_id: &str) -> Result<()> {
        let mut sessions: Vec<Session> = self.files.read_json_file(SESSIONS)?;
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        if sessions.len() != before {
            self.files.write_json_file(SESSIONS, &sessions)?;
        }
        Ok(())
    }

    fn session_cleanup_expired(&self) -> Result<usize> {
        let mut sessions: Vec<Session> = self.files.read_json_file(SESSIONS)?;
        let before = sessions.len();
        let current = now();
        sessions.retain(|s| s.expires_at > current);
        let removed = before - sessions.len();
        if removed > 0 {
            self.files.write_json_file(SESSIONS, &sessions)?;
        }
        Ok(removed)
    }

    // ── Pages ───────────────────────────────────────────────────────

    fn page_find_by_id(&self, id: i64) -> Option<Page> {
        self.pages().into_iter().find(|p| p.id == id)
    }

    fn page_find_by_slug(&self, slug: &str) -> Option<Page> {
        self.pages().into_iter().find(|p| p.slug == slug)
    }

    fn page_list(&self, status: Option<&str>) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .pages()
            .into_iter()
            .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
            .collect();
        pages.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        });
        pages
    }

    fn page_count(&self, status: Option<&str>) -> usize {
        self.pages()
            .iter()
            .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
            .count()
    }

    fn page_create(&self, form: &PageForm, user: &str) -> Result<Page> {
        form.validate()?;
        let mut pages: Vec<Page> = self.files.read_json_file(PAGES)?;
        let slug = unique_slug(&form.slug, &form.title, |s| pages.iter().any(|p| p.slug == s));
        let ts = now();
        let mut page = Page {
            id: next_id(&pages),
            title: String::new(),
            slug,
            content: String::new(),
            template: "default".to_string(),
            status: "draft".to_string(),
            meta_title: None,
            meta_description: None,
            parent_id: None,
            sort_order: 0,
            author: user.to_string(),
            created_at: ts,
            updated_at: ts,
        };
        Self::apply_page_form(&mut page, form);
        pages.push(page.clone());
        self.files.write_json_file(PAGES, &pages)?;
        self.record_history(&page, "create", user);
        Ok(page)
    }

    fn page_update(&self, id: i64, form: &PageForm, user: &str) -> Result<Page> {
        form.validate()?;
        let mut pages: Vec<Page> = self.files.read_json_file(PAGES)?;
        let slug = unique_slug(&form.slug, &form.title, |s| {
            pages.iter().any(|p| p.id != id && p.slug == s)
        });
        let page = pages
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CmsError::not_found("Page not found"))?;
        Self::apply_page_form(page, form);
        page.slug = slug;
        page.updated_at = now();
        let updated = page.clone();
        self.files.write_json_file(PAGES, &pages)?;
        self.record_history(&updated, "update", user);
        Ok(updated)
    }

    fn page_set_content(&self, id: i64, content: &str, user: &str) -> Result<Page> {
        let mut pages: Vec<Page> = self.files.read_json_file(PAGES)?;
        let page = pages
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CmsError::not_found("Page not found"))?;
        page.content = content.to_string();
        page.updated_at = now();
        let updated = page.clone();
        self.files.write_json_file(PAGES, &pages)?;
        self.record_history(&updated, "builder", user);
        Ok(updated)
    }

    fn page_delete(&self, id: i64, user: &str) -> Result<Page> {
        let mut pages: Vec<Page> = self.files.read_json_file(PAGES)?;
        let idx = pages
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CmsError::not_found("Page not found"))?;
        let removed = pages.remove(idx);
        for p in pages.iter_mut() {
            if p.parent_id == Some(id) {
                p.parent_id = None;
            }
        }
        self.files.write_json_file(PAGES, &pages)?;
        self.record_history(&removed, "delete", user);

        // Menu items pointing at the page go with it.
        let mut menus: Vec<Menu> = self.files.read_json_file(MENUS)?;
        let mut touched = 0;
        for menu in menus.iter_mut() {
            touched += remove_page_refs(&mut menu.items, id);
        }
        if touched > 0 {
            self.files.write_json_file(MENUS, &menus)?;
        }

        if let Err(e) = self.draft_discard(id) {
            log::warn!("Failed to remove draft of deleted page {}: {}", id, e);
        }

        if self.setting_get_i64("home_page_id") == id {
            self.setting_set("home_page_id", "")?;
        }
        Ok(removed)
    }

    // ── Page history ────────────────────────────────────────────────

    fn page_history(&self, page_id: i64) -> Vec<PageHistoryEntry> {
        let history: Vec<PageHistoryEntry> = self.files.read_json_file_or_default(PAGE_HISTORY);
        let mut entries: Vec<PageHistoryEntry> =
            history.into_iter().filter(|h| h.page_id == page_id).collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }

    fn page_history_get(&self, id: i64) -> Option<PageHistoryEntry> {
        let history: Vec<PageHistoryEntry> = self.files.read_json_file_or_default(PAGE_HISTORY);
        history.into_iter().find(|h| h.id == id)
    }

    fn page_restore(&self, history_id: i64, user: &str) -> Result<Page> {
        let entry = self
            .page_history_get(history_id)
            .ok_or_else(|| CmsError::not_found("History entry not found"))?;
        let mut pages: Vec<Page> = self.files.read_json_file(PAGES)?;
        let slug = unique_slug(&entry.slug, &entry.title, |s| {
            pages.iter().any(|p| p.id != entry.page_id && p.slug == s)
        });
        let ts = now();

        let restored = match pages.iter_mut().find(|p| p.id == entry.page_id) {
            Some(page) => {
                page.title = entry.title.clone();
                page.slug = slug;
                page.content = entry.content.clone();
                page.updated_at = ts;
                page.clone()
            }
            None => {
                // The page was deleted: bring it back as a draft.
                let page = Page {
                    id: entry.page_id,
                    title: entry.title.clone(),
                    slug,
                    content: entry.content.clone(),
                    template: "default".to_string(),
                    status: "draft".to_string(),
                    meta_title: None,
                    meta_description: None,
                    parent_id: None,
                    sort_order: 0,
                    author: user.to_string(),
                    created_at: ts,
                    updated_at: ts,
                };
                pages.push(page.clone());
                page
            }
        };
        self.files.write_json_file(PAGES, &pages)?;
        self.record_history(&restored, "restore", user);
        Ok(restored)
    }

    // ── Drafts ──────────────────────────────────────────────────────

    fn draft_get(&self, page_id: i64) -> Option<PageDraft> {
        self.files
            .read_json_file_or_default::<Option<PageDraft>>(&draft_file_name(page_id))
    }

    fn draft_save(&self, page_id: i64, content: &str, user: &str) -> Result<PageDraft> {
        if self.page_find_by_id(page_id).is_none() {
            return Err(CmsError::not_found("Page not found"));
        }
        let draft = PageDraft {
            page_id,
            content: content.to_string(),
            user: user.to_string(),
            saved_at: now(),
        };
        self.files
            .write_json_file(&draft_file_name(page_id), &Some(draft.clone()))?;
        Ok(draft)
    }

    fn draft_discard(&self, page_id: i64) -> Result<bool> {
        self.files.remove_file(&draft_file_name(page_id))
    }

    // ── Blog posts ──────────────────────────────────────────────────

    fn post_find_by_id(&self, id: i64) -> Option<BlogPost> {
        self.posts().into_iter().find(|p| p.id == id)
    }

    fn post_find_by_slug(&self, slug: &str) -> Option<BlogPost> {
        self.posts().into_iter().find(|p| p.slug == slug)
    }

    fn post_list(&self, status: Option<&str>, category: Option<&str>) -> Vec<BlogPost> {
        let mut posts: Vec<BlogPost> = self
            .posts()
            .into_iter()
            .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
            .filter(|p| category.map(|c| p.in_category(c)).unwrap_or(true))
            .collect();
        posts.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()).then(b.id.cmp(&a.id)));
        posts
    }

    fn post_count(&self, status: Option<&str>) -> usize {
        self.posts()
            .iter()
            .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
            .count()
    }

    fn post_create(&self, form: &BlogPostForm, author: &str) -> Result<BlogPost> {
        form.validate()?;
        let mut posts: Vec<BlogPost> = self.files.read_json_file(POSTS)?;
        let slug = unique_slug(&form.slug, &form.title, |s| posts.iter().any(|p| p.slug == s));
        let ts = now();
        let mut post = BlogPost {
            id: next_id(&posts),
            title: String::new(),
            slug,
            content: String::new(),
            excerpt: None,
            category: String::new(),
            tags: Vec::new(),
            author: author.to_string(),
            status: "draft".to_string(),
            featured_image: None,
            published_at: None,
            created_at: ts,
            updated_at: ts,
        };
        Self::apply_post_form(&mut post, form);
        posts.push(post.clone());
        self.files.write_json_file(POSTS, &posts)?;
        Ok(post)
    }

    fn post_update(&self, id: i64, form: &BlogPostForm) -> Result<BlogPost> {
        form.validate()?;
        let mut posts: Vec<BlogPost> = self.files.read_json_file(POSTS)?;
        let slug = unique_slug(&form.slug, &form.title, |s| {
            posts.iter().any(|p| p.id != id && p.slug == s)
        });
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CmsError::not_found("Post not found"))?;
        Self::apply_post_form(post, form);
        post.slug = slug;
        post.updated_at = now();
        let updated = post.clone();
        self.files.write_json_file(POSTS, &posts)?;
        Ok(updated)
    }

    fn post_delete(&self, id: i64) -> Result<BlogPost> {
        let mut posts: Vec<BlogPost> = self.files.read_json_file(POSTS)?;
        let idx = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CmsError::not_found("Post not found"))?;
        let removed = posts.remove(idx);
        self.files.write_json_file(POSTS, &posts)?;
        Ok(removed)
    }

    // ── Blog categories ─────────────────────────────────────────────

    fn category_list(&self) -> Vec<BlogCategory> {
        let mut cats: Vec<BlogCategory> = self.files.read_json_file_or_default(CATEGORIES);
        cats.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        cats
    }

    fn category_find_by_id(&self, id: i64) -> Option<BlogCategory> {
        self.category_list().into_iter().find(|c| c.id == id)
    }

    fn category_find_by_slug(&self, slug: &str) -> Option<BlogCategory> {
        self.category_list().into_iter().find(|c| c.slug == slug)
    }

    fn category_create(&self, name: &str) -> Result<BlogCategory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CmsError::invalid_fields(
                "Category name is required",
                vec!["name".to_string()],
            ));
        }
        let mut cats: Vec<BlogCategory> = self.files.read_json_file(CATEGORIES)?;
        if cats.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(CmsError::conflict(format!("Category '{}' already exists", name)));
        }
        let slug = unique_slug("", name, |s| cats.iter().any(|c| c.slug == s));
        let cat = BlogCategory {
            id: next_id(&cats),
            name: name.to_string(),
            slug,
        };
        cats.push(cat.clone());
        self.files.write_json_file(CATEGORIES, &cats)?;
        Ok(cat)
    }

    fn category_rename(&self, id: i64, name: &str) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CmsError::invalid_fields(
                "Category name is required",
                vec!["name".to_string()],
            ));
        }
        let mut cats: Vec<BlogCategory> = self.files.read_json_file(CATEGORIES)?;
        if cats
            .iter()
            .any(|c| c.id != id && c.name.eq_ignore_ascii_case(name))
        {
            return Err(CmsError::conflict(format!("Category '{}' already exists", name)));
        }
        let slug = unique_slug("", name, |s| cats.iter().any(|c| c.id != id && c.slug == s));
        let cat = cats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CmsError::not_found("Category not found"))?;
        let old_name = std::mem::replace(&mut cat.name, name.to_string());
        cat.slug = slug;
        self.files.write_json_file(CATEGORIES, &cats)?;

        let mut posts: Vec<BlogPost> = self.files.read_json_file(POSTS)?;
        let mut moved = 0;
        for post in posts.iter_mut().filter(|p| p.in_category(&old_name)) {
            post.category = name.to_string();
            moved += 1;
        }
        if moved > 0 {
            self.files.write_json_file(POSTS, &posts)?;
        }
        Ok(moved)
    }

    fn category_delete(&self, id: i64) -> Result<usize> {
        let mut cats: Vec<BlogCategory> = self.files.read_json_file(CATEGORIES)?;
        let idx = cats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CmsError::not_found("Category not found"))?;
        let removed = cats.remove(idx);
        self.files.write_json_file(CATEGORIES, &cats)?;

        let mut posts: Vec<BlogPost> = self.files.read_json_file(POSTS)?;
        let mut cleared = 0;
        for post in posts.iter_mut().filter(|p| p.in_category(&removed.name)) {
            post.category.clear();
            cleared += 1;
        }
        if cleared > 0 {
            self.files.write_json_file(POSTS, &posts)?;
        }
        Ok(cleared)
    }

    // ── Events ──────────────────────────────────────────────────────

    fn event_find_by_id(&self, id: i64) -> Option<Event> {
        self.event_list().into_iter().find(|e| e.id == id)
    }

    fn event_find_by_slug(&self, slug: &str) -> Option<Event> {
        self.event_list().into_iter().find(|e| e.slug == slug)
    }

    fn event_list(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.files.read_json_file_or_default(EVENTS);
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        events
    }

    fn event_upcoming(&self, at: NaiveDateTime, limit: usize) -> Vec<Event> {
        self.event_list()
            .into_iter()
            .filter(|e| e.status == "published" && e.is_upcoming(at))
            .take(limit)
            .collect()
    }

    fn event_count(&self) -> usize {
        self.event_list().len()
    }

    fn event_create(&self, form: &EventForm) -> Result<Event> {
        let (starts_at, ends_at) = form.validate()?;
        let mut events: Vec<Event> = self.files.read_json_file(EVENTS)?;
        let slug = unique_slug(&form.slug, &form.title, |s| events.iter().any(|e| e.slug == s));
        let ts = now();
        let event = Event {
            id: next_id(&events),
            title: form.title.trim().to_string(),
            slug,
            description: form.description.clone(),
            location: form.location.trim().to_string(),
            starts_at,
            ends_at,
            status: form.status.clone().unwrap_or_else(|| "published".to_string()),
            created_at: ts,
            updated_at: ts,
        };
        events.push(event.clone());
        self.files.write_json_file(EVENTS, &events)?;
        Ok(event)
    }

    fn event_update(&self, id: i64, form: &EventForm) -> Result<Event> {
        let (starts_at, ends_at) = form.validate()?;
        let mut events: Vec<Event> = self.files.read_json_file(EVENTS)?;
        let slug = unique_slug(&form.slug, &form.title, |s| {
            events.iter().any(|e| e.id != id && e.slug == s)
        });
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CmsError::not_found("Event not found"))?;
        event.title = form.title.trim().to_string();
        event.slug = slug;
        event.description = form.description.clone();
        event.location = form.location.trim().to_string();
        event.starts_at = starts_at;
        event.ends_at = ends_at;
        if let Some(s) = &form.status {
            event.status = s.clone();
        }
        event.updated_at = now();
        let updated = event.clone();
        self.files.write_json_file(EVENTS, &events)?;
        Ok(updated)
    }

    fn event_delete(&self, id: i64) -> Result<Event> {
        let mut events: Vec<Event> = self.files.read_json_file(EVENTS)?;
        let idx = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CmsError::not_found("Event not found"))?;
        let removed = events.remove(idx);
        self.files.write_json_file(EVENTS, &events)?;
        Ok(removed)
    }

    // ── Menus ───────────────────────────────────────────────────────

    fn menu_find_by_id(&self, id: i64) -> Option<Menu> {
        self.menu_list().into_iter().find(|m| m.id == id)
    }

    fn menu_find_by_location(&self, location: &str) -> Option<Menu> {
        self.menu_list().into_iter().find(|m| m.location == location)
    }

    fn menu_list(&self) -> Vec<Menu> {
        self.files.read_json_file_or_default(MENUS)
    }

    fn menu_create(&self, form: &MenuForm) -> Result<Menu> {
        form.validate()?;
        let mut menus: Vec<Menu> = self.files.read_json_file(MENUS)?;
        let location = form.location.trim();
        if !location.is_empty() && menus.iter().any(|m| m.location == location) {
            return Err(CmsError::conflict(format!(
                "A menu is already assigned to '{}'",
                location
            )));
        }
        let menu = Menu {
            id: next_id(&menus),
            name: form.name.trim().to_string(),
            location: location.to_string(),
            items: form.items.clone(),
        };
        menus.push(menu.clone());
        self.files.write_json_file(MENUS, &menus)?;
        Ok(menu)
    }

    fn menu_update(&self, id: i64, form: &MenuForm) -> Result<Menu> {
        form.validate()?;
        let mut menus: Vec<Menu> = self.files.read_json_file(MENUS)?;
        let location = form.location.trim();
        if !location.is_empty()
            && menus
                .iter()
                .any(|m| m.id != id && m.location == location)
        {
            return Err(CmsError::conflict(format!(
                "A menu is already assigned to '{}'",
                location
            )));
        }
        let menu = menus
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CmsError::not_found("Menu not found"))?;
        menu.name = form.name.trim().to_string();
        menu.location = location.to_string();
        menu.items = form.items.clone();
        let updated = menu.clone();
        self.files.write_json_file(MENUS, &menus)?;
        Ok(updated)
    }

    fn menu_delete(&self, id: i64) -> Result<Menu> {
        let mut menus: Vec<Menu> = self.files.read_json_file(MENUS)?;
        let idx = menus
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CmsError::not_found("Menu not found"))?;
        let removed = menus.remove(idx);
        self.files.write_json_file(MENUS, &menus)?;
        Ok(removed)
    }

    // ── Forms ───────────────────────────────────────────────────────

    fn form_find_by_id(&self, id: i64) -> Option<FormDefinition> {
        self.form_list().into_iter().find(|f| f.id == id)
    }

    fn form_find_by_slug(&self, slug: &str) -> Option<FormDefinition> {
        self.form_list().into_iter().find(|f| f.slug == slug)
    }

    fn form_list(&self) -> Vec<FormDefinition> {
        self.files.read_json_file_or_default(FORMS)
    }

    fn form_create(&self, form: &FormDefinitionForm) -> Result<FormDefinition> {
        form.validate()?;
        let mut forms: Vec<FormDefinition> = self.files.read_json_file(FORMS)?;
        let slug = unique_slug(&form.slug, &form.name, |s| forms.iter().any(|f| f.slug == s));
        let ts = now();
        let mut def = FormDefinition {
            id: next_id(&forms),
            name: form.name.trim().to_string(),
            slug,
            fields: form.fields.clone(),
            submit_label: "Send".to_string(),
            success_message: "Thank you! Your message has been sent.".to_string(),
            notify_email: non_empty(form.notify_email.clone()),
            created_at: ts,
            updated_at: ts,
        };
        if let Some(l) = non_empty(form.submit_label.clone()) {
            def.submit_label = l;
        }
        if let Some(m) = non_empty(form.success_message.clone()) {
            def.success_message = m;
        }
        forms.push(def.clone());
        self.files.write_json_file(FORMS, &forms)?;
        Ok(def)
    }

    fn form_update(&self, id: i64, form: &FormDefinitionForm) -> Result<FormDefinition> {
        form.validate()?;
        let mut forms: Vec<FormDefinition> = self.files.read_json_file(FORMS)?;
        let slug = unique_slug(&form.slug, &form.name, |s| {
            forms.iter().any(|f| f.id != id && f.slug == s)
        });
        let def = forms
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| CmsError::not_found("Form not found"))?;
        def.name = form.name.trim().to_string();
        def.slug = slug;
        def.fields = form.fields.clone();
        if let Some(l) = non_empty(form.submit_label.clone()) {
            def.submit_label = l;
        }
        if let Some(m) = non_empty(form.success_message.clone()) {
            def.success_message = m;
        }
        def.notify_email = non_empty(form.notify_email.clone());
        def.updated_at = now();
        let updated = def.clone();
        self.files.write_json_file(FORMS, &forms)?;
        Ok(updated)
    }

    fn form_delete(&self, id: i64) -> Result<(FormDefinition, usize)> {
        let mut forms: Vec<FormDefinition> = self.files.read_json_file(FORMS)?;
        let idx = forms
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| CmsError::not_found("Form not found"))?;
        let removed = forms.remove(idx);
        self.files.write_json_file(FORMS, &forms)?;

        let dropped = self.files.with_locked_file(SUBMISSIONS, || {
            let mut subs: Vec<FormSubmission> = self.files.read_json_file(SUBMISSIONS)?;
            let before = subs.len();
            subs.retain(|s| s.form_id != id);
            let dropped = before - subs.len();
            if dropped > 0 {
                self.files.write_json_file(SUBMISSIONS, &subs)?;
            }
            Ok(dropped)
        })?;
        Ok((removed, dropped))
    }

    // ── Form submissions ────────────────────────────────────────────

    fn submission_create(
        &self,
        form_id: i64,
        data: BTreeMap<String, String>,
        ip: Option<&str>,
    ) -> Result<FormSubmission> {
        self.files.with_locked_file(SUBMISSIONS, || {
            let mut subs: Vec<FormSubmission> = self.files.read_json_file(SUBMISSIONS)?;
            let sub = FormSubmission {
                id: next_id(&subs),
                form_id,
                data,
                ip: ip.map(str::to_string),
                read: false,
                created_at: now(),
            };
            subs.push(sub.clone());
            self.files.write_json_file(SUBMISSIONS, &subs)?;
            Ok(sub)
        })
    }

    fn submission_find_by_id(&self, id: i64) -> Option<FormSubmission> {
        let subs: Vec<FormSubmission> = self.files.read_json_file_or_default(SUBMISSIONS);
        subs.into_iter().find(|s| s.id == id)
    }

    fn submission_list(&self, form_id: Option<i64>) -> Vec<FormSubmission> {
        let subs: Vec<FormSubmission> = self.files.read_json_file_or_default(SUBMISSIONS);
        let mut subs: Vec<FormSubmission> = subs
            .into_iter()
            .filter(|s| form_id.map(|f| s.form_id == f).unwrap_or(true))
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        subs
    }

    fn submission_count(&self, form_id: Option<i64>, unread_only: bool) -> usize {
        let subs: Vec<FormSubmission> = self.files.read_json_file_or_default(SUBMISSIONS);
        subs.iter()
            .filter(|s| form_id.map(|f| s.form_id == f).unwrap_or(true))
            .filter(|s| !unread_only || !s.read)
            .count()
    }

    fn submission_mark_read(&self, id: i64) -> Result<()> {
        self.files.with_locked_file(SUBMISSIONS, || {
            let mut subs: Vec<FormSubmission> = self.files.read_json_file(SUBMISSIONS)?;
            let sub = subs
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| CmsError::not_found("Submission not found"))?;
            if !sub.read {
                sub.read = true;
                self.files.write_json_file(SUBMISSIONS, &subs)?;
            }
            Ok(())
        })
    }

    fn submission_delete(&self, id: i64) -> Result<()> {
        self.files.with_locked_file(SUBMISSIONS, || {
            let mut subs: Vec<FormSubmission> = self.files.read_json_file(SUBMISSIONS)?;
            let before = subs.len();
            subs.retain(|s| s.id != id);
            if subs.len() == before {
                return Err(CmsError::not_found("Submission not found"));
            }
            self.files.write_json_file(SUBMISSIONS, &subs)
        })
    }

    // ── Media ───────────────────────────────────────────────────────

    fn media_list(&self) -> Vec<MediaItem> {
        let mut items: Vec<MediaItem> = self.files.read_json_file_or_default(MEDIA);
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        items
    }

    fn media_find_by_id(&self, id: i64) -> Option<MediaItem> {
        self.media_list().into_iter().find(|m| m.id == id)
    }

    fn media_create(
        &self,
        filename: &str,
        original_name: &str,
        mime: &str,
        size: u64,
    ) -> Result<MediaItem> {
        let mut items: Vec<MediaItem> = self.files.read_json_file(MEDIA)?;
        let item = MediaItem {
            id: next_id(&items),
            filename: filename.to_string(),
            original_name: original_name.to_string(),
            mime: mime.to_string(),
            size,
            alt: String::new(),
            uploaded_at: now(),
        };
        items.push(item.clone());
        self.files.write_json_file(MEDIA, &items)?;
        Ok(item)
    }

    fn media_update_alt(&self, id: i64, alt: &str) -> Result<MediaItem> {
        let mut items: Vec<MediaItem> = self.files.read_json_file(MEDIA)?;
        let item = items
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CmsError::not_found("Media item not found"))?;
        item.alt = alt.trim().to_string();
        let updated = item.clone();
        self.files.write_json_file(MEDIA, &items)?;
        Ok(updated)
    }

    fn media_delete(&self, id: i64) -> Result<MediaItem> {
        let mut items: Vec<MediaItem> = self.files.read_json_file(MEDIA)?;
        let idx = items
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CmsError::not_found("Media item not found"))?;
        let removed = items.remove(idx);
        self.files.write_json_file(MEDIA, &items)?;
        Ok(removed)
    }

    // ── Activity log ────────────────────────────────────────────────

    fn log_record(&self, entry: NewLogEntry) {
        let result = (|| -> Result<()> {
            let mut logs: Vec<LogEntry> = self.files.read_json_file(LOGS)?;
            logs.push(LogEntry {
                id: next_id(&logs),
                user: entry.user,
                action: entry.action,
                entity_type: entry.entity_type,
                entity_id: entry.entity_id,
                entity_title: entry.entity_title,
                details: entry.details,
                ip: entry.ip,
                created_at: now(),
            });
            if logs.len() > self.log_limit {
                let excess = logs.len() - self.log_limit;
                logs.drain(..excess);
            }
            self.files.write_json_file(LOGS, &logs)
        })();
        if let Err(e) = result {
            log::error!("Failed to write activity log: {}", e);
        }
    }

    fn log_list(
        &self,
        action: Option<&str>,
        entity_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<LogEntry> {
        let logs: Vec<LogEntry> = self.files.read_json_file_or_default(LOGS);
        logs.into_iter()
            .rev()
            .filter(|l| action.map(|a| l.action == a).unwrap_or(true))
            .filter(|l| {
                entity_type
                    .map(|t| l.entity_type.as_deref() == Some(t))
                    .unwrap_or(true)
            })
            .skip(offset)
            .take(limit)
            .collect()
    }

    fn log_count(&self, action: Option<&str>, entity_type: Option<&str>) -> usize {
        let logs: Vec<LogEntry> = self.files.read_json_file_or_default(LOGS);
        logs.iter()
            .filter(|l| action.map(|a| l.action == a).unwrap_or(true))
            .filter(|l| {
                entity_type
                    .map(|t| l.entity_type.as_deref() == Some(t))
                    .unwrap_or(true)
            })
            .count()
    }

    fn log_clear(&self) -> Result<usize> {
        let logs: Vec<LogEntry> = self.files.read_json_file(LOGS)?;
        let count = logs.len();
        self.files.write_json_file(LOGS, &Vec::<LogEntry>::new())?;
        Ok(count)
    }
}
