use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::builder::BuilderSessions;
use crate::error::CmsError;
use crate::models::page::{PageForm, PAGE_TEMPLATES};
use crate::security::auth::{ClientIp, EditorUser};
use crate::site;
use crate::store::Store;

// ── Pages ──────────────────────────────────────────────

#[get("/pages?<status>")]
pub fn pages_list(_editor: EditorUser, store: &State<Arc<dyn Store>>, status: Option<&str>) -> Json<Value> {
    let status = status.filter(|s| !s.is_empty());
    let pages = store.page_list(status);
    Json(json!({
        "ok": true,
        "pages": pages,
        "home_page_id": site::home_page_id(&**store.inner()),
        "templates": PAGE_TEMPLATES,
        "count_all": store.page_count(None),
        "count_published": store.page_count(Some("published")),
        "count_draft": store.page_count(Some("draft")),
    }))
}

#[get("/pages/<id>")]
pub fn page_get(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let page = store
        .page_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Page not found"))?;
    let draft = store.draft_get(id);
    Ok(Json(json!({
        "ok": true,
        "page": page,
        "url": site::page_path(&**store.inner(), &page),
        "draft_saved_at": draft.map(|d| d.saved_at),
    })))
}

#[post("/pages", format = "json", data = "<form>")]
pub fn page_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<PageForm>,
) -> ApiResult {
    let page = store.page_create(&form, &editor.user.username)?;
    store.log_record(activity(&editor.user, &ip, "create", "page").entity(page.id, &page.title));
    Ok(Json(json!({"ok": true, "page": page})))
}

#[put("/pages/<id>", format = "json", data = "<form>")]
pub fn page_update(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<PageForm>,
) -> ApiResult {
    let page = store.page_update(id, &form, &editor.user.username)?;
    store.log_record(activity(&editor.user, &ip, "update", "page").entity(page.id, &page.title));
    Ok(Json(json!({"ok": true, "page": page})))
}

#[delete("/pages/<id>")]
pub fn page_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let page = store.page_delete(id, &editor.user.username)?;
    sessions.close_page(id);
    store.log_record(activity(&editor.user, &ip, "delete", "page").entity(page.id, &page.title));
    Ok(Json(json!({"ok": true, "id": page.id})))
}

// ── History ────────────────────────────────────────────

#[get("/pages/<id>/history", rank = 2)]
pub fn page_history(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> Json<Value> {
    let entries: Vec<Value> = store
        .page_history(id)
        .into_iter()
        .map(|h| {
            json!({
                "id": h.id,
                "page_id": h.page_id,
                "title": h.title,
                "slug": h.slug,
                "action": h.action,
                "user": h.user,
                "created_at": h.created_at,
                "size": h.content.len(),
            })
        })
        .collect();
    Json(json!({"ok": true, "history": entries}))
}

#[get("/pages/history/<hid>")]
pub fn page_history_entry(_editor: EditorUser, store: &State<Arc<dyn Store>>, hid: i64) -> ApiResult {
    let entry = store
        .page_history_get(hid)
        .ok_or_else(|| CmsError::not_found("History entry not found"))?;
    Ok(Json(json!({"ok": true, "entry": entry})))
}

#[post("/pages/history/<hid>/restore")]
pub fn page_restore(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    ip: ClientIp,
    hid: i64,
) -> ApiResult {
    let page = store.page_restore(hid, &editor.user.username)?;
    sessions.close_page(page.id);
    store.log_record(
        activity(&editor.user, &ip, "restore", "page")
            .entity(page.id, &page.title)
            .details(format!("from history #{}", hid)),
    );
    Ok(Json(json!({"ok": true, "page": page})))
}

pub fn routes() -> Vec<Route> {
    routes![
        pages_list,
        page_get,
        page_create,
        page_update,
        page_delete,
        page_history,
        page_history_entry,
        page_restore
    ]
}
