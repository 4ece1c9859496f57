#![cfg(test)]

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::Value;
use tempfile::TempDir;

use crate::config::CmsConfig;
use crate::dashboard::DashboardAggregator;
use crate::error::CmsError;
use crate::models::blog::BlogPostForm;
use crate::models::event::EventForm;
use crate::models::form::{
    screen_submission, submissions_to_csv, FormDefinitionForm, FormField, Screened,
};
use crate::models::log::NewLogEntry;
use crate::models::menu::{resolve_items, MenuForm, MenuItem};
use crate::models::now;
use crate::models::page::PageForm;
use crate::models::settings::SettingsService;
use crate::models::user::{Session, UserForm};
use crate::security::auth;
use crate::site;
use crate::sitemap;
use crate::store::{JsonStore, Store};

/// Fresh store in its own temp directory, with default settings seeded.
/// The `TempDir` must outlive the store.
fn test_store() -> (TempDir, JsonStore) {
    test_store_with_limits(25, 1000)
}

fn test_store_with_limits(history_limit: usize, log_limit: usize) -> (TempDir, JsonStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = JsonStore::open(dir.path(), history_limit, log_limit).expect("open store");
    store.seed_defaults().expect("seed defaults");
    (dir, store)
}

/// Fast bcrypt hash for tests (cost=4 instead of DEFAULT_COST=12).
fn fast_hash(password: &str) -> String {
    bcrypt::hash(password, 4).unwrap()
}

fn page_form(title: &str, status: &str) -> PageForm {
    PageForm {
        title: title.to_string(),
        content: format!("<p>{}</p>", title),
        status: Some(status.to_string()),
        ..Default::default()
    }
}

fn user_form(username: &str, role: &str) -> UserForm {
    UserForm {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        display_name: username.to_string(),
        role: role.to_string(),
        status: "active".to_string(),
        password: Some("long-enough-password".to_string()),
    }
}

fn field(name: &str, kind: &str, required: bool) -> FormField {
    FormField {
        name: name.to_string(),
        label: name.to_string(),
        kind: kind.to_string(),
        required,
        options: Vec::new(),
        placeholder: None,
    }
}

fn contact_form() -> FormDefinitionForm {
    FormDefinitionForm {
        name: "Contact".to_string(),
        fields: vec![
            field("name", "text", true),
            field("email", "email", true),
            field("message", "textarea", false),
        ],
        ..Default::default()
    }
}

fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_seeded_with_defaults() {
    let (_dir, store) = test_store();
    assert_eq!(store.setting_get("site_name"), Some("My Site".to_string()));
    assert_eq!(store.setting_get_i64("posts_per_page"), 10);
    assert!(store.setting_get_bool("sitemap_enabled"));
}

#[test]
fn seed_defaults_keeps_existing_values() {
    let (_dir, store) = test_store();
    store.setting_set("site_name", "Renamed").unwrap();
    store.seed_defaults().unwrap();
    assert_eq!(store.setting_get("site_name"), Some("Renamed".to_string()));
}

#[test]
fn settings_service_rejects_bad_values() {
    let (_dir, store) = test_store();
    let service = SettingsService::new(&store);
    let err = service
        .update(&raw(&[("posts_per_page", "0"), ("site_url", "ftp://example.com")]))
        .unwrap_err();
    match err {
        CmsError::Validation { fields, .. } => {
            assert_eq!(fields, vec!["posts_per_page".to_string(), "site_url".to_string()]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    // Nothing was written
    assert_eq!(store.setting_get_i64("posts_per_page"), 10);
}

#[test]
fn settings_service_caps_upload_size() {
    let (_dir, store) = test_store();
    let service = SettingsService::new(&store);
    let err = service.update(&raw(&[("media_max_mb", "64")])).unwrap_err();
    match err {
        CmsError::Validation { fields, .. } => assert_eq!(fields, vec!["media_max_mb".to_string()]),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(service.update(&raw(&[("media_max_mb", "32")])).is_ok());
    assert_eq!(store.setting_get_i64("media_max_mb"), 32);
}

#[test]
fn settings_service_rejects_unknown_key() {
    let (_dir, store) = test_store();
    let err = SettingsService::new(&store)
        .update(&raw(&[("no_such_key", "x")]))
        .unwrap_err();
    assert_eq!(err.status(), Status::BadRequest);
}

#[test]
fn settings_service_home_page_must_exist() {
    let (_dir, store) = test_store();
    let service = SettingsService::new(&store);
    assert!(service.update(&raw(&[("home_page_id", "42")])).is_err());

    let page = store.page_create(&page_form("Home", "published"), "admin").unwrap();
    let keys = service
        .update(&raw(&[("home_page_id", &page.id.to_string()), ("site_name", "  Acme  ")]))
        .unwrap();
    assert_eq!(keys, vec!["home_page_id".to_string(), "site_name".to_string()]);
    assert_eq!(store.setting_get("site_name"), Some("Acme".to_string()));
    assert_eq!(store.setting_get_i64("home_page_id"), page.id);
}

// ═══════════════════════════════════════════════════════════
// Pages
// ═══════════════════════════════════════════════════════════

#[test]
fn page_ids_are_sequential() {
    let (_dir, store) = test_store();
    let a = store.page_create(&page_form("One", "draft"), "admin").unwrap();
    let b = store.page_create(&page_form("Two", "draft"), "admin").unwrap();
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);

    // Ids are not reused after a delete
    store.page_delete(b.id, "admin").unwrap();
    let c = store.page_create(&page_form("Three", "draft"), "admin").unwrap();
    assert_eq!(c.id, 2);
    store.page_delete(a.id, "admin").unwrap();
    let d = store.page_create(&page_form("Four", "draft"), "admin").unwrap();
    assert_eq!(d.id, 3);
}

#[test]
fn page_slugs_are_unique() {
    let (_dir, store) = test_store();
    let a = store.page_create(&page_form("About Us", "draft"), "admin").unwrap();
    let b = store.page_create(&page_form("About Us", "draft"), "admin").unwrap();
    let c = store.page_create(&page_form("About Us", "draft"), "admin").unwrap();
    assert_eq!(a.slug, "about-us");
    assert_eq!(b.slug, "about-us-2");
    assert_eq!(c.slug, "about-us-3");

    // Updating a page keeps its own slug
    let same = store.page_update(a.id, &page_form("About Us", "draft"), "admin").unwrap();
    assert_eq!(same.slug, "about-us");
}

#[test]
fn page_reserved_slug_rejected() {
    let (_dir, store) = test_store();
    let err = store.page_create(&page_form("Blog", "draft"), "admin").unwrap_err();
    assert_eq!(err.status(), Status::BadRequest);
}

#[test]
fn page_requires_title() {
    let (_dir, store) = test_store();
    match store.page_create(&page_form("   ", "draft"), "admin") {
        Err(CmsError::Validation { fields, .. }) => assert!(fields.contains(&"title".to_string())),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn page_delete_cascades() {
    let (_dir, store) = test_store();
    let home = store.page_create(&page_form("Home", "published"), "admin").unwrap();
    let other = store.page_create(&page_form("Other", "published"), "admin").unwrap();
    store.setting_set("home_page_id", &home.id.to_string()).unwrap();

    store
        .menu_create(&MenuForm {
            name: "Main".to_string(),
            location: "primary".to_string(),
            items: vec![
                MenuItem {
                    label: "Home".to_string(),
                    page: Some(home.id),
                    ..Default::default()
                },
                MenuItem {
                    label: "Other".to_string(),
                    page: Some(other.id),
                    children: vec![MenuItem {
                        label: "Home again".to_string(),
                        page: Some(home.id),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ],
        })
        .unwrap();
    store.draft_save(home.id, "<p>draft</p>", "admin").unwrap();

    store.page_delete(home.id, "admin").unwrap();

    assert!(store.page_find_by_id(home.id).is_none());
    assert!(store.draft_get(home.id).is_none());
    assert_eq!(store.setting_get("home_page_id"), Some(String::new()));

    let menu = store.menu_find_by_location("primary").unwrap();
    assert_eq!(menu.items.len(), 1);
    assert_eq!(menu.items[0].page, Some(other.id));
    assert!(menu.items[0].children.is_empty());
}

#[test]
fn page_delete_detaches_children() {
    let (_dir, store) = test_store();
    let parent = store.page_create(&page_form("Parent", "published"), "admin").unwrap();
    let mut form = page_form("Child", "published");
    form.parent_id = Some(parent.id);
    let child = store.page_create(&form, "admin").unwrap();
    assert_eq!(child.parent_id, Some(parent.id));

    store.page_delete(parent.id, "admin").unwrap();
    assert_eq!(store.page_find_by_id(child.id).unwrap().parent_id, None);
}

// ═══════════════════════════════════════════════════════════
// Page history & drafts
// ═══════════════════════════════════════════════════════════

#[test]
fn history_is_capped_per_page() {
    let (_dir, store) = test_store_with_limits(3, 1000);
    let page = store.page_create(&page_form("Capped", "draft"), "admin").unwrap();
    let other = store.page_create(&page_form("Untouched", "draft"), "admin").unwrap();
    for i in 0..5 {
        let mut form = page_form("Capped", "draft");
        form.content = format!("<p>rev {}</p>", i);
        store.page_update(page.id, &form, "admin").unwrap();
    }

    let history = store.page_history(page.id);
    assert_eq!(history.len(), 3);
    // Newest first
    assert_eq!(history[0].content, "<p>rev 4</p>");
    assert_eq!(history[2].content, "<p>rev 2</p>");
    assert!(history.iter().all(|h| h.action == "update"));

    assert_eq!(store.page_history(other.id).len(), 1);
}

#[test]
fn history_restore_rewinds_content() {
    let (_dir, store) = test_store();
    let page = store.page_create(&page_form("Restorable", "published"), "admin").unwrap();
    let mut form = page_form("Restorable", "published");
    form.content = "<p>changed</p>".to_string();
    store.page_update(page.id, &form, "editor").unwrap();

    let original = store
        .page_history(page.id)
        .into_iter()
        .find(|h| h.action == "create")
        .unwrap();
    let restored = store.page_restore(original.id, "admin").unwrap();
    assert_eq!(restored.content, "<p>Restorable</p>");
    // Status is not part of a snapshot
    assert_eq!(restored.status, "published");
    assert_eq!(store.page_history(page.id)[0].action, "restore");
}

#[test]
fn history_restore_recreates_deleted_page_as_draft() {
    let (_dir, store) = test_store();
    let page = store.page_create(&page_form("Gone", "published"), "admin").unwrap();
    store.page_delete(page.id, "admin").unwrap();

    let entry = store
        .page_history(page.id)
        .into_iter()
        .find(|h| h.action == "delete")
        .unwrap();
    let restored = store.page_restore(entry.id, "admin").unwrap();
    assert_eq!(restored.id, page.id);
    assert_eq!(restored.slug, "gone");
    assert_eq!(restored.status, "draft");
    assert!(store.page_find_by_id(page.id).is_some());
}

#[test]
fn history_restore_unknown_entry() {
    let (_dir, store) = test_store();
    let err = store.page_restore(999, "admin").unwrap_err();
    assert_eq!(err.status(), Status::NotFound);
}

#[test]
fn builder_content_save_records_history() {
    let (_dir, store) = test_store();
    let page = store.page_create(&page_form("Built", "draft"), "admin").unwrap();
    let updated = store.page_set_content(page.id, "<section>x</section>", "admin").unwrap();
    assert_eq!(updated.content, "<section>x</section>");
    assert_eq!(store.page_history(page.id)[0].action, "builder");
}

#[test]
fn draft_save_and_discard() {
    let (_dir, store) = test_store();
    let page = store.page_create(&page_form("Drafty", "draft"), "admin").unwrap();
    assert!(store.draft_get(page.id).is_none());

    store.draft_save(page.id, "<p>wip</p>", "admin").unwrap();
    assert_eq!(store.draft_get(page.id).unwrap().content, "<p>wip</p>");
    // The page itself is untouched
    assert_eq!(store.page_find_by_id(page.id).unwrap().content, "<p>Drafty</p>");

    assert!(store.draft_discard(page.id).unwrap());
    assert!(!store.draft_discard(page.id).unwrap());
    assert!(store.draft_get(page.id).is_none());
}

#[test]
fn draft_for_missing_page_rejected() {
    let (_dir, store) = test_store();
    assert!(store.draft_save(7, "<p>x</p>", "admin").is_err());
}

// ═══════════════════════════════════════════════════════════
// Blog
// ═══════════════════════════════════════════════════════════

fn post_form(title: &str, category: &str) -> BlogPostForm {
    BlogPostForm {
        title: title.to_string(),
        content: "<p>Body</p>".to_string(),
        category: category.to_string(),
        tags: "rust, cms, rust".to_string(),
        status: Some("published".to_string()),
        ..Default::default()
    }
}

#[test]
fn post_publish_sets_date_and_tags() {
    let (_dir, store) = test_store();
    let post = store.post_create(&post_form("Hello", ""), "admin").unwrap();
    assert!(post.published_at.is_some());
    assert_eq!(post.tags, vec!["rust".to_string(), "cms".to_string()]);
    assert_eq!(post.slug, "hello");
}

#[test]
fn category_rename_moves_posts() {
    let (_dir, store) = test_store();
    let cat = store.category_create("News").unwrap();
    store.post_create(&post_form("One", "News"), "admin").unwrap();
    store.post_create(&post_form("Two", "news"), "admin").unwrap();
    store.post_create(&post_form("Three", ""), "admin").unwrap();

    let moved = store.category_rename(cat.id, "Updates").unwrap();
    assert_eq!(moved, 2);
    assert_eq!(store.category_find_by_id(cat.id).unwrap().slug, "updates");
    assert_eq!(store.post_list(None, Some("Updates")).len(), 2);
    assert!(store.post_list(None, Some("News")).is_empty());
}

#[test]
fn category_delete_uncategorizes_posts() {
    let (_dir, store) = test_store();
    let cat = store.category_create("Temp").unwrap();
    let post = store.post_create(&post_form("Orphan", "Temp"), "admin").unwrap();

    assert_eq!(store.category_delete(cat.id).unwrap(), 1);
    assert_eq!(store.post_find_by_id(post.id).unwrap().category, "");
    assert!(store.category_list().is_empty());
}

#[test]
fn category_names_are_unique() {
    let (_dir, store) = test_store();
    store.category_create("News").unwrap();
    let err = store.category_create("news").unwrap_err();
    assert_eq!(err.status(), Status::Conflict);
}

// ═══════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════

#[test]
fn event_upcoming_filters_past() {
    let (_dir, store) = test_store();
    let at = now();
    let fmt = |t: chrono::NaiveDateTime| t.format("%Y-%m-%dT%H:%M").to_string();
    for (title, starts) in [
        ("Past", at - Duration::days(3)),
        ("Soon", at + Duration::days(1)),
        ("Later", at + Duration::days(10)),
    ] {
        store
            .event_create(&EventForm {
                title: title.to_string(),
                starts_at: fmt(starts),
                ..Default::default()
            })
            .unwrap();
    }
    let upcoming = store.event_upcoming(at, 10);
    let titles: Vec<&str> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Soon", "Later"]);
    assert_eq!(store.event_upcoming(at, 1).len(), 1);
}

#[test]
fn event_requires_valid_start() {
    let (_dir, store) = test_store();
    let err = store
        .event_create(&EventForm {
            title: "Broken".to_string(),
            starts_at: "tomorrow".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    match err {
        CmsError::Validation { fields, .. } => assert_eq!(fields, vec!["starts_at".to_string()]),
        other => panic!("expected validation error, got {:?}", other),
    }
}

// ═══════════════════════════════════════════════════════════
// Forms & submissions
// ═══════════════════════════════════════════════════════════

#[test]
fn form_definition_rejects_duplicate_fields() {
    let (_dir, store) = test_store();
    let mut form = contact_form();
    form.fields.push(field("email", "text", false));
    assert!(store.form_create(&form).is_err());
}

#[test]
fn form_submission_validation() {
    let (_dir, store) = test_store();
    let form = store.form_create(&contact_form()).unwrap();

    match screen_submission(&form, &raw(&[("name", ""), ("email", "not-an-email")])) {
        Err(CmsError::Validation { fields, .. }) => {
            assert_eq!(fields, vec!["name".to_string(), "email".to_string()]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let ok = screen_submission(
        &form,
        &raw(&[("name", " Ada "), ("email", "ada@example.com"), ("extra", "dropped")]),
    )
    .unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("name".to_string(), "Ada".to_string());
    expected.insert("email".to_string(), "ada@example.com".to_string());
    assert_eq!(ok, Screened::Accept(expected));
}

#[test]
fn form_honeypot_discards_silently() {
    let (_dir, store) = test_store();
    let form = store.form_create(&contact_form()).unwrap();
    // Even an otherwise invalid submission is discarded without error
    let screened = screen_submission(&form, &raw(&[("_hp", "http://spam.example")])).unwrap();
    assert_eq!(screened, Screened::Discard);
}

#[test]
fn form_select_must_match_option() {
    let (_dir, store) = test_store();
    let mut def = contact_form();
    let mut topic = field("topic", "select", true);
    topic.options = vec!["Sales".to_string(), "Support".to_string()];
    def.fields.push(topic);
    let form = store.form_create(&def).unwrap();

    let base = [("name", "Ada"), ("email", "ada@example.com")];
    let mut bad = raw(&base);
    bad.insert("topic".to_string(), "Other".to_string());
    assert!(screen_submission(&form, &bad).is_err());

    let mut good = raw(&base);
    good.insert("topic".to_string(), "Support".to_string());
    assert!(matches!(screen_submission(&form, &good), Ok(Screened::Accept(_))));
}

#[test]
fn form_csv_export_header_order() {
    let (_dir, store) = test_store();
    let form = store.form_create(&contact_form()).unwrap();

    let mut first = BTreeMap::new();
    first.insert("email".to_string(), "ada@example.com".to_string());
    first.insert("name".to_string(), "Ada".to_string());
    store.submission_create(form.id, first, Some("abc")).unwrap();

    // A key the definition no longer has
    let mut second = BTreeMap::new();
    second.insert("name".to_string(), "Bob, Jr.".to_string());
    second.insert("zeta".to_string(), "old".to_string());
    second.insert("alpha".to_string(), "older".to_string());
    store.submission_create(form.id, second, None).unwrap();

    let csv = submissions_to_csv(&form, &store.submission_list(Some(form.id))).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,submitted_at,ip,name,email,message,alpha,zeta"
    );
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.contains("\"Bob, Jr.\"")));
}

#[test]
fn form_delete_drops_submissions() {
    let (_dir, store) = test_store();
    let keep = store.form_create(&contact_form()).unwrap();
    let gone = store
        .form_create(&FormDefinitionForm {
            name: "Survey".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.submission_create(keep.id, BTreeMap::new(), None).unwrap();
    store.submission_create(gone.id, BTreeMap::new(), None).unwrap();
    store.submission_create(gone.id, BTreeMap::new(), None).unwrap();

    let (_, dropped) = store.form_delete(gone.id).unwrap();
    assert_eq!(dropped, 2);
    assert_eq!(store.submission_count(None, false), 1);
}

#[test]
fn submission_read_flag() {
    let (_dir, store) = test_store();
    let form = store.form_create(&contact_form()).unwrap();
    let sub = store.submission_create(form.id, BTreeMap::new(), None).unwrap();
    assert_eq!(store.submission_count(Some(form.id), true), 1);
    store.submission_mark_read(sub.id).unwrap();
    assert_eq!(store.submission_count(Some(form.id), true), 0);
    assert_eq!(store.submission_count(Some(form.id), false), 1);
}

// ═══════════════════════════════════════════════════════════
// Users & sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn user_create_rejects_duplicates() {
    let (_dir, store) = test_store();
    store.user_create(&user_form("ada", "admin"), &fast_hash("pw")).unwrap();
    let mut dup = user_form("ADA", "editor");
    dup.email = "other@example.com".to_string();
    assert_eq!(
        store.user_create(&dup, &fast_hash("pw")).unwrap_err().status(),
        Status::Conflict
    );
    let mut dup_email = user_form("bob", "editor");
    dup_email.email = "ada@example.com".to_string();
    assert!(store.user_create(&dup_email, &fast_hash("pw")).is_err());
}

#[test]
fn user_form_validation() {
    let mut form = user_form("bad name!", "owner");
    form.password = Some("short".to_string());
    match form.validate(true) {
        Err(CmsError::Validation { fields, .. }) => {
            assert_eq!(
                fields,
                vec!["username".to_string(), "role".to_string(), "password".to_string()]
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    // Password is only checked on create
    assert!(user_form("fine", "editor").validate(false).is_ok());
}

#[test]
fn last_admin_is_protected() {
    let (_dir, store) = test_store();
    let admin = store.user_create(&user_form("root", "admin"), &fast_hash("pw")).unwrap();

    assert_eq!(store.user_delete(admin.id).unwrap_err().status(), Status::Conflict);

    let mut demote = user_form("root", "editor");
    demote.password = None;
    assert!(store.user_update(admin.id, &demote).is_err());

    let mut lock = user_form("root", "admin");
    lock.status = "locked".to_string();
    assert!(store.user_update(admin.id, &lock).is_err());

    // With a second active admin the first one may go
    store.user_create(&user_form("backup", "admin"), &fast_hash("pw")).unwrap();
    store.user_delete(admin.id).unwrap();
    assert_eq!(store.user_count(), 1);
}

#[test]
fn locked_user_loses_sessions() {
    let (_dir, store) = test_store();
    store.user_create(&user_form("root", "admin"), &fast_hash("pw")).unwrap();
    let editor = store.user_create(&user_form("ed", "editor"), &fast_hash("pw")).unwrap();
    let sid = auth::create_session(&store, editor.id, Some("127.0.0.1"), None).unwrap();
    assert_eq!(store.session_get_user(&sid).unwrap().id, editor.id);

    let mut lock = user_form("ed", "editor");
    lock.status = "locked".to_string();
    store.user_update(editor.id, &lock).unwrap();
    assert!(store.session_get_user(&sid).is_none());
}

#[test]
fn session_expiry() {
    let (_dir, store) = test_store();
    let user = store.user_create(&user_form("root", "admin"), &fast_hash("pw")).unwrap();
    let past = now() - Duration::hours(2);
    store
        .session_create(Session {
            id: "stale".to_string(),
            user_id: user.id,
            ip: None,
            user_agent: None,
            created_at: past - Duration::hours(24),
            expires_at: past,
        })
        .unwrap();
    assert!(store.session_get_user("stale").is_none());

    let fresh = auth::create_session(&store, user.id, None, None).unwrap();
    assert!(store.session_get_user(&fresh).is_some());
    // Creating a session already pruned the stale one
    assert_eq!(store.session_cleanup_expired().unwrap(), 0);

    store.session_delete(&fresh).unwrap();
    assert!(store.session_get_user(&fresh).is_none());
}

#[test]
fn authenticate_checks_password_and_status() {
    let (_dir, store) = test_store();
    store.user_create(&user_form("root", "admin"), &fast_hash("correct horse")).unwrap();
    let mut locked = user_form("sleepy", "editor");
    locked.status = "locked".to_string();
    store.user_create(&locked, &fast_hash("correct horse")).unwrap();

    assert!(auth::authenticate(&store, "ROOT", "correct horse").is_some());
    assert!(auth::authenticate(&store, "root", "wrong").is_none());
    assert!(auth::authenticate(&store, "sleepy", "correct horse").is_none());
    assert!(auth::authenticate(&store, "nobody", "correct horse").is_none());
}

// ═══════════════════════════════════════════════════════════
// Activity log
// ═══════════════════════════════════════════════════════════

#[test]
fn log_is_capped_and_newest_first() {
    let (_dir, store) = test_store_with_limits(25, 3);
    for i in 0..5 {
        store.log_record(NewLogEntry::new("admin", "update", "page").entity(i, "Page"));
    }
    let entries = store.log_list(None, None, 10, 0);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].entity_id, Some(4));
    assert_eq!(entries[2].entity_id, Some(2));
}

#[test]
fn log_filters_and_clear() {
    let (_dir, store) = test_store();
    store.log_record(NewLogEntry::new("admin", "create", "page"));
    store.log_record(NewLogEntry::new("admin", "delete", "page"));
    store.log_record(NewLogEntry::new("admin", "create", "event"));

    assert_eq!(store.log_count(Some("create"), None), 2);
    assert_eq!(store.log_count(None, Some("page")), 2);
    assert_eq!(store.log_list(Some("create"), Some("event"), 10, 0).len(), 1);
    assert_eq!(store.log_list(None, None, 10, 2).len(), 1);

    assert_eq!(store.log_clear().unwrap(), 3);
    assert_eq!(store.log_count(None, None), 0);
}

// ═══════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════

#[test]
fn dashboard_counts_reflect_store() {
    let (_dir, store) = test_store();
    store.page_create(&page_form("Live", "published"), "admin").unwrap();
    store.page_create(&page_form("Hidden", "draft"), "admin").unwrap();
    store.post_create(&post_form("Post", ""), "admin").unwrap();
    let mut draft_post = post_form("Draft post", "");
    draft_post.status = Some("draft".to_string());
    store.post_create(&draft_post, "admin").unwrap();
    store.category_create("News").unwrap();
    let form = store.form_create(&contact_form()).unwrap();
    let sub = store.submission_create(form.id, BTreeMap::new(), None).unwrap();
    store.submission_create(form.id, BTreeMap::new(), None).unwrap();
    store.submission_mark_read(sub.id).unwrap();
    store.user_create(&user_form("root", "admin"), &fast_hash("pw")).unwrap();

    let at = now();
    store
        .event_create(&EventForm {
            title: "Launch".to_string(),
            starts_at: (at + Duration::days(2)).format("%Y-%m-%dT%H:%M").to_string(),
            ..Default::default()
        })
        .unwrap();

    let stats = DashboardAggregator::new(&store).stats_at(at);
    let c = &stats.counts;
    assert_eq!((c.pages, c.pages_published, c.pages_draft), (2, 1, 1));
    assert_eq!((c.posts, c.posts_published, c.posts_draft), (2, 1, 1));
    assert_eq!(c.categories, 1);
    assert_eq!((c.events, c.events_upcoming), (1, 1));
    assert_eq!((c.forms, c.submissions, c.submissions_unread), (1, 2, 1));
    assert_eq!(c.users, 1);
    assert_eq!(c.media, 0);
    assert_eq!(stats.next_event.unwrap().title, "Launch");
    assert_eq!(stats.recent_submissions.len(), 2);
    assert!(stats.storage_bytes > 0);
}

// ═══════════════════════════════════════════════════════════
// Sitemap & robots
// ═══════════════════════════════════════════════════════════

#[test]
fn sitemap_lists_published_content_only() {
    let (_dir, store) = test_store();
    let home = store.page_create(&page_form("Home", "published"), "admin").unwrap();
    store.page_create(&page_form("About", "published"), "admin").unwrap();
    store.page_create(&page_form("Secret", "draft"), "admin").unwrap();
    store.post_create(&post_form("First post", ""), "admin").unwrap();
    store.setting_set("home_page_id", &home.id.to_string()).unwrap();
    store.setting_set("site_url", "https://example.com/").unwrap();

    let xml = sitemap::generate_sitemap(&store).unwrap();
    assert!(xml.contains("<loc>https://example.com/</loc>"));
    assert!(xml.contains("<loc>https://example.com/about</loc>"));
    assert!(xml.contains("<loc>https://example.com/blog/first-post</loc>"));
    assert!(!xml.contains("secret"));
    // Home page only appears as "/"
    assert!(!xml.contains("https://example.com/home<"));
}

#[test]
fn sitemap_disabled() {
    let (_dir, store) = test_store();
    store.setting_set("sitemap_enabled", "false").unwrap();
    assert!(sitemap::generate_sitemap(&store).is_none());
    assert!(!sitemap::generate_robots(&store).contains("Sitemap:"));
}

#[test]
fn robots_points_at_sitemap() {
    let (_dir, store) = test_store();
    let robots = sitemap::generate_robots(&store);
    assert!(robots.starts_with("User-agent: *"));
    assert!(robots.ends_with("Sitemap: http://localhost:8000/sitemap.xml"));
}

// ═══════════════════════════════════════════════════════════
// Menus & home page
// ═══════════════════════════════════════════════════════════

fn menu_item(label: &str, page: Option<i64>, url: Option<&str>) -> MenuItem {
    MenuItem {
        label: label.to_string(),
        page,
        url: url.map(str::to_string),
        target: "_self".to_string(),
        ..Default::default()
    }
}

#[test]
fn menu_resolution_drops_dead_page_refs() {
    let (_dir, store) = test_store();
    let home = store.page_create(&page_form("Home", "published"), "admin").unwrap();
    let about = store.page_create(&page_form("About", "published"), "admin").unwrap();
    let secret = store.page_create(&page_form("Secret", "draft"), "admin").unwrap();

    let mut about_item = menu_item("About", Some(about.id), None);
    about_item.children = vec![
        menu_item("Secret", Some(secret.id), None),
        MenuItem {
            target: "_blank".to_string(),
            ..menu_item("Docs", None, Some("https://docs.example.com"))
        },
    ];
    let mut gone = menu_item("Gone", Some(99), None);
    gone.children = vec![menu_item("Orphan", None, Some("/orphan"))];
    let items = vec![menu_item("Home", Some(home.id), None), about_item, gone];

    let resolved = resolve_items(&items, &store.page_list(None), Some(home.id), "/about");
    let labels: Vec<&str> = resolved.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["Home", "About"]);
    assert_eq!(resolved[0].href, "/");
    assert!(!resolved[0].active);
    assert_eq!(resolved[1].href, "/about");
    assert!(resolved[1].active);

    // Draft child dropped, external link kept
    assert_eq!(resolved[1].children.len(), 1);
    let docs = &resolved[1].children[0];
    assert_eq!(docs.href, "https://docs.example.com");
    assert_eq!(docs.target, "_blank");
    assert!(!docs.active);
}

#[test]
fn fallback_home_page_is_served_at_root() {
    let (_dir, store) = test_store();
    let alpha = store.page_create(&page_form("Alpha", "published"), "admin").unwrap();
    let beta = store.page_create(&page_form("Beta", "published"), "admin").unwrap();
    assert_eq!(store.setting_get("home_page_id"), Some(String::new()));

    assert_eq!(site::home_page(&store).unwrap().id, alpha.id);
    assert_eq!(site::page_path(&store, &alpha), "/");
    assert_eq!(site::page_path(&store, &beta), "/beta");

    store
        .menu_create(&MenuForm {
            name: "Main".to_string(),
            location: "primary".to_string(),
            items: vec![
                menu_item("Alpha", Some(alpha.id), None),
                menu_item("Beta", Some(beta.id), None),
            ],
        })
        .unwrap();
    let menu = site::resolved_menu(&store, "primary", "/");
    assert_eq!(menu[0].href, "/");
    assert!(menu[0].active);
    assert_eq!(menu[1].href, "/beta");

    let xml = sitemap::generate_sitemap(&store).unwrap();
    assert!(xml.contains("<loc>http://localhost:8000/</loc><lastmod>"));
    assert!(xml.contains("<loc>http://localhost:8000/beta</loc>"));
    assert!(!xml.contains("/alpha<"));
}

// ═══════════════════════════════════════════════════════════
// JSON file cache
// ═══════════════════════════════════════════════════════════

#[test]
fn cache_picks_up_external_edits() {
    let (dir, store) = test_store();
    store.page_create(&page_form("Cached", "draft"), "admin").unwrap();
    assert_eq!(store.page_count(None), 1);

    std::fs::write(dir.path().join("pages.json"), "[]").unwrap();
    assert_eq!(store.page_count(None), 0);

    std::fs::remove_file(dir.path().join("pages.json")).unwrap();
    assert!(store.page_list(None).is_empty());
}

#[test]
fn corrupt_file_fails_writes() {
    let (dir, store) = test_store();
    std::fs::write(dir.path().join("pages.json"), "{ not json").unwrap();
    // Reads fall back to empty, writes refuse to clobber the file
    assert!(store.page_list(None).is_empty());
    let err = store.page_create(&page_form("Clobber", "draft"), "admin").unwrap_err();
    assert_eq!(err.status(), Status::InternalServerError);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("pages.json")).unwrap(),
        "{ not json"
    );
}

#[test]
fn writes_are_visible_to_a_second_store() {
    let (dir, store) = test_store();
    store.page_create(&page_form("Shared", "published"), "admin").unwrap();
    let other = JsonStore::open(dir.path(), 25, 1000).unwrap();
    assert_eq!(other.page_find_by_slug("shared").unwrap().title, "Shared");
}

// ═══════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════

const ADMIN_PASSWORD: &str = "admin-password";
const EDITOR_PASSWORD: &str = "editor-password";

/// Rocket instance over a temp data directory with one admin and one editor.
fn test_client() -> (TempDir, Client) {
    let dir = TempDir::new().expect("temp dir");
    let store = JsonStore::open(dir.path().join("data"), 25, 1000).expect("open store");
    store.seed_defaults().unwrap();
    store.user_create(&user_form("admin", "admin"), &fast_hash(ADMIN_PASSWORD)).unwrap();
    store.user_create(&user_form("editor", "editor"), &fast_hash(EDITOR_PASSWORD)).unwrap();

    let config = CmsConfig {
        data_dir: dir.path().join("data"),
        uploads_dir: dir.path().join("uploads"),
        blocks_dir: PathBuf::from("website/blocks"),
        ..Default::default()
    }
    .normalized();
    std::fs::create_dir_all(&config.uploads_dir).unwrap();

    let figment = rocket::Config::figment()
        .merge(("template_dir", "website/templates"))
        .merge(("log_level", "off"));
    let store: Arc<dyn Store> = Arc::new(store);
    let client = Client::tracked(crate::build(figment, config, store)).expect("valid rocket");
    (dir, client)
}

fn login(client: &Client, username: &str, password: &str) -> Status {
    client
        .post("/admin/login")
        .header(ContentType::Form)
        .body(format!("username={}&password={}", username, password))
        .dispatch()
        .status()
}

fn json_body(resp: rocket::local::blocking::LocalResponse<'_>) -> Value {
    serde_json::from_str(&resp.into_string().unwrap()).unwrap()
}

#[test]
fn http_api_requires_session() {
    let (_dir, client) = test_client();
    let resp = client.get("/admin/api/pages").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
    assert_eq!(resp.content_type(), Some(ContentType::JSON));
    let body = json_body(resp);
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "E_UNAUTHORIZED");
}

#[test]
fn http_admin_pages_redirect_to_login() {
    let (_dir, client) = test_client();
    for path in ["/admin", "/admin/modules/pages"] {
        let resp = client.get(path).dispatch();
        assert_eq!(resp.status(), Status::SeeOther, "{}", path);
        assert_eq!(resp.headers().get_one("Location"), Some("/admin/login"));
    }
    let login_page = client.get("/admin/login").dispatch();
    assert_eq!(login_page.status(), Status::Ok);
    assert!(login_page
        .headers()
        .get_one("Cache-Control")
        .unwrap_or("")
        .contains("no-store"));
}

#[test]
fn http_login_and_crud() {
    let (_dir, client) = test_client();
    assert_eq!(login(&client, "admin", "wrong"), Status::Ok);
    assert_eq!(
        client.get("/admin/api/pages").dispatch().status(),
        Status::Unauthorized
    );

    assert_eq!(login(&client, "admin", ADMIN_PASSWORD), Status::SeeOther);

    let created = client
        .post("/admin/api/pages")
        .header(ContentType::JSON)
        .body(r#"{"title":"About","content":"<p>Hi</p>","status":"published"}"#)
        .dispatch();
    assert_eq!(created.status(), Status::Ok);
    let body = json_body(created);
    assert_eq!(body["page"]["slug"], "about");

    let invalid = client
        .post("/admin/api/pages")
        .header(ContentType::JSON)
        .body(r#"{"title":""}"#)
        .dispatch();
    assert_eq!(invalid.status(), Status::BadRequest);
    let body = json_body(invalid);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["fields"][0], "title");

    let missing = client.get("/admin/api/pages/99").dispatch();
    assert_eq!(missing.status(), Status::NotFound);
    assert_eq!(json_body(missing)["code"], "E_NOT_FOUND");

    let list = json_body(client.get("/admin/api/pages").dispatch());
    assert_eq!(list["count_published"], 1);

    // Public side
    let page = client.get("/about").dispatch();
    assert_eq!(page.status(), Status::Ok);
    assert!(page.into_string().unwrap().contains("<p>Hi</p>"));
}

#[test]
fn http_editor_cannot_manage_users() {
    let (_dir, client) = test_client();
    assert_eq!(login(&client, "editor", EDITOR_PASSWORD), Status::SeeOther);

    let resp = client.get("/admin/api/users").dispatch();
    assert_eq!(resp.status(), Status::Forbidden);
    assert_eq!(json_body(resp)["code"], "E_FORBIDDEN");

    assert_eq!(
        client.get("/admin/api/settings").dispatch().status(),
        Status::Forbidden
    );
    // Content is fine
    assert_eq!(client.get("/admin/api/pages").dispatch().status(), Status::Ok);
}

#[test]
fn http_logout_ends_session() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    assert_eq!(client.get("/admin/api/dashboard").dispatch().status(), Status::Ok);
    assert_eq!(client.get("/admin/logout").dispatch().status(), Status::SeeOther);
    assert_eq!(
        client.get("/admin/api/dashboard").dispatch().status(),
        Status::Unauthorized
    );
}

#[test]
fn http_builder_undo_redo() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    client
        .post("/admin/api/pages")
        .header(ContentType::JSON)
        .body(r#"{"title":"Canvas","content":"<p>v0</p>"}"#)
        .dispatch();

    assert_eq!(
        client.post("/admin/api/builder/1/undo").dispatch().status(),
        Status::NotFound
    );

    let opened = json_body(client.post("/admin/api/builder/1/open").dispatch());
    assert_eq!(opened["state"]["html"], "<p>v0</p>");

    let snap = json_body(
        client
            .post("/admin/api/builder/1/snapshot")
            .header(ContentType::JSON)
            .body(r#"{"html":"<p>v1</p>"}"#)
            .dispatch(),
    );
    assert_eq!(snap["draft_saved"], true);

    let undone = json_body(client.post("/admin/api/builder/1/undo").dispatch());
    assert_eq!(undone["state"]["html"], "<p>v0</p>");
    let redone = json_body(client.post("/admin/api/builder/1/redo").dispatch());
    assert_eq!(redone["state"]["html"], "<p>v1</p>");

    let saved = client
        .post("/admin/api/builder/1/save")
        .header(ContentType::JSON)
        .body(r#"{"html":"<p>v1</p>"}"#)
        .dispatch();
    assert_eq!(saved.status(), Status::Ok);
    assert_eq!(json_body(saved)["page"]["content"], "<p>v1</p>");
}

#[test]
fn http_public_not_found() {
    let (_dir, client) = test_client();
    assert_eq!(client.get("/no-such-page").dispatch().status(), Status::NotFound);
    assert_eq!(client.get("/blog/missing").dispatch().status(), Status::NotFound);
    assert_eq!(client.get("/").dispatch().status(), Status::Ok);
}

#[test]
fn http_sitemap_and_robots() {
    let (_dir, client) = test_client();
    let sitemap = client.get("/sitemap.xml").dispatch();
    assert_eq!(sitemap.status(), Status::Ok);
    assert_eq!(sitemap.content_type(), Some(ContentType::XML));
    assert!(sitemap.into_string().unwrap().contains("<urlset"));

    let robots = client.get("/robots.txt").dispatch();
    assert_eq!(robots.content_type(), Some(ContentType::Plain));
    assert!(robots.into_string().unwrap().contains("Sitemap:"));
}

#[test]
fn http_public_form_submission() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    let created = client
        .post("/admin/api/forms")
        .header(ContentType::JSON)
        .body(
            r#"{"name":"Contact","fields":[
                {"name":"name","label":"Name","required":true},
                {"name":"email","label":"Email","kind":"email","required":true}
            ]}"#,
        )
        .dispatch();
    assert_eq!(created.status(), Status::Ok);

    assert_eq!(client.get("/forms/contact").dispatch().status(), Status::Ok);

    let bad = client
        .post("/forms/contact")
        .header(ContentType::Form)
        .body("name=&email=nope")
        .dispatch();
    assert_eq!(bad.status(), Status::BadRequest);

    let spam = client
        .post("/forms/contact")
        .header(ContentType::Form)
        .body("name=Bot&email=bot%40example.com&_hp=gotcha")
        .dispatch();
    assert_eq!(spam.status(), Status::Ok);

    let good = client
        .post("/forms/contact")
        .header(ContentType::Form)
        .body("name=Ada&email=ada%40example.com")
        .dispatch();
    assert_eq!(good.status(), Status::Ok);

    let subs = json_body(client.get("/admin/api/forms/submissions?form_id=1").dispatch());
    assert_eq!(subs["submissions"].as_array().unwrap().len(), 1);
}

#[test]
fn http_builder_reopen_after_undo_keeps_undone_state() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    client
        .post("/admin/api/pages")
        .header(ContentType::JSON)
        .body(r#"{"title":"Canvas","content":"<p>v0</p>"}"#)
        .dispatch();

    client.post("/admin/api/builder/1/open").dispatch();
    client
        .post("/admin/api/builder/1/snapshot")
        .header(ContentType::JSON)
        .body(r#"{"html":"<p>v1</p>"}"#)
        .dispatch();
    let undone = json_body(client.post("/admin/api/builder/1/undo").dispatch());
    assert_eq!(undone["state"]["html"], "<p>v0</p>");
    assert_eq!(undone["draft_saved"], true);

    let reopened = json_body(client.post("/admin/api/builder/1/open").dispatch());
    assert_eq!(reopened["state"]["html"], "<p>v0</p>");
    assert_eq!(reopened["draft"]["content"], "<p>v0</p>");
}

#[test]
fn http_builder_open_prefers_newer_draft() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    client
        .post("/admin/api/pages")
        .header(ContentType::JSON)
        .body(r#"{"title":"Canvas","content":"<p>live</p>"}"#)
        .dispatch();

    let fresh = json_body(client.post("/admin/api/builder/1/open").dispatch());
    assert_eq!(fresh["state"]["html"], "<p>live</p>");
    assert!(fresh["draft"].is_null());

    client
        .post("/admin/api/builder/1/snapshot")
        .header(ContentType::JSON)
        .body(r#"{"html":"<p>autosaved</p>"}"#)
        .dispatch();

    let reopened = json_body(client.post("/admin/api/builder/1/open").dispatch());
    assert_eq!(reopened["state"]["html"], "<p>autosaved</p>");
    assert_eq!(reopened["page"]["content"], "<p>live</p>");
    assert!(!reopened["state"]["can_undo"].as_bool().unwrap());

    // Discarding falls back to the live content
    client.delete("/admin/api/builder/1/draft").dispatch();
    let discarded = json_body(client.post("/admin/api/builder/1/open").dispatch());
    assert_eq!(discarded["state"]["html"], "<p>live</p>");
}

const BOUNDARY: &str = "flatcms-test-boundary";

fn multipart_file(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, filename
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload<'c>(client: &'c Client, filename: &str, bytes: &[u8]) -> rocket::local::blocking::LocalResponse<'c> {
    client
        .post("/admin/api/media")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", BOUNDARY)))
        .body(multipart_file(filename, bytes))
        .dispatch()
}

#[test]
fn http_media_upload_rules_and_delete() {
    let (dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);

    let exe = upload(&client, "setup.exe", b"MZ");
    assert_eq!(exe.status(), Status::BadRequest);
    assert_eq!(json_body(exe)["fields"][0], "file");

    let settings = client
        .put("/admin/api/settings")
        .header(ContentType::JSON)
        .body(r#"{"media_max_mb":"1"}"#)
        .dispatch();
    assert_eq!(settings.status(), Status::Ok);
    let big = vec![0u8; 1024 * 1024 + 1];
    let oversize = upload(&client, "huge.png", &big);
    assert_eq!(oversize.status(), Status::BadRequest);
    assert_eq!(json_body(oversize)["code"], "E_VALIDATION");

    let ok = upload(&client, "pixel.png", b"\x89PNG\r\n\x1a\n");
    assert_eq!(ok.status(), Status::Ok);
    let body = json_body(ok);
    let filename = body["media"]["filename"].as_str().unwrap().to_string();
    assert!(filename.ends_with(".png"));
    let stored = dir.path().join("uploads").join(&filename);
    assert!(stored.exists());

    let id = body["media"]["id"].as_i64().unwrap();
    let deleted = client.delete(format!("/admin/api/media/{}", id)).dispatch();
    assert_eq!(deleted.status(), Status::Ok);
    assert!(!stored.exists());
    let list = json_body(client.get("/admin/api/media").dispatch());
    assert!(list["media"].as_array().unwrap().is_empty());
}

#[test]
fn http_blog_list_is_paginated() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    client
        .put("/admin/api/settings")
        .header(ContentType::JSON)
        .body(r#"{"posts_per_page":"1"}"#)
        .dispatch();
    for title in ["First", "Second"] {
        let created = client
            .post("/admin/api/posts")
            .header(ContentType::JSON)
            .body(format!(r#"{{"title":"{}","status":"published"}}"#, title))
            .dispatch();
        assert_eq!(created.status(), Status::Ok);
    }

    let page_one = client.get("/blog").dispatch().into_string().unwrap();
    assert!(page_one.contains("/blog/second"));
    assert!(!page_one.contains("/blog/first\""));
    assert!(page_one.contains("Page 1 of 2"));

    let page_two = client.get("/blog?page=2").dispatch().into_string().unwrap();
    assert!(page_two.contains("/blog/first"));
    assert!(page_two.contains("Page 2 of 2"));

    // Out of range clamps to the last page
    let clamped = client.get("/blog?page=9").dispatch().into_string().unwrap();
    assert!(clamped.contains("Page 2 of 2"));
}

#[test]
fn http_orphan_category_lists_posts() {
    let (_dir, client) = test_client();
    login(&client, "admin", ADMIN_PASSWORD);
    client
        .post("/admin/api/posts")
        .header(ContentType::JSON)
        .body(r#"{"title":"Lisbon","category":"Travel","status":"published"}"#)
        .dispatch();

    let index = client.get("/blog").dispatch().into_string().unwrap();
    assert!(index.contains("/blog/category/travel"));

    let listing = client.get("/blog/category/travel").dispatch();
    assert_eq!(listing.status(), Status::Ok);
    assert!(listing.into_string().unwrap().contains("/blog/lisbon"));

    assert_eq!(
        client.get("/blog/category/unknown").dispatch().status(),
        Status::NotFound
    );
}
