use std::sync::Arc;
use std::time::Instant;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{activity, ApiResult};
use crate::builder::{BlockInstance, BlockRegistry, BuilderSessions};
use crate::error::CmsError;
use crate::models::page::Page;
use crate::security::auth::{ClientIp, EditorUser};
use crate::store::Store;

// ── Block catalogue ────────────────────────────────────

#[get("/builder/blocks")]
pub fn blocks_list(_editor: EditorUser, blocks: &State<BlockRegistry>) -> Json<Value> {
    Json(json!({"ok": true, "blocks": blocks.list()}))
}

#[derive(Debug, Deserialize)]
pub struct RenderForm {
    pub block: String,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

#[post("/builder/render", format = "json", data = "<form>")]
pub fn block_render(
    _editor: EditorUser,
    blocks: &State<BlockRegistry>,
    form: Json<RenderForm>,
) -> ApiResult {
    let html = blocks.render_block(&form.block, &form.settings)?;
    Ok(Json(json!({"ok": true, "html": html})))
}

#[derive(Debug, Deserialize)]
pub struct ComposeForm {
    pub blocks: Vec<BlockInstance>,
}

#[post("/builder/compose", format = "json", data = "<form>")]
pub fn blocks_compose(
    _editor: EditorUser,
    blocks: &State<BlockRegistry>,
    form: Json<ComposeForm>,
) -> ApiResult {
    let html = blocks.compose(&form.blocks)?;
    Ok(Json(json!({"ok": true, "html": html})))
}

// ── Editing sessions ───────────────────────────────────

fn find_page(store: &dyn Store, page_id: i64) -> Result<Page, CmsError> {
    store
        .page_find_by_id(page_id)
        .ok_or_else(|| CmsError::not_found("Page not found"))
}

/// Start editing. An autosaved draft newer than the page wins over the
/// published content.
#[post("/builder/<page_id>/open")]
pub fn builder_open(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    page_id: i64,
) -> ApiResult {
    let page = find_page(&**store.inner(), page_id)?;
    let draft = store
        .draft_get(page_id)
        .filter(|d| d.saved_at >= page.updated_at);
    let initial = draft.as_ref().map(|d| d.content.as_str()).unwrap_or(&page.content);
    let state = sessions.open(editor.user.id, page_id, initial);
    Ok(Json(json!({
        "ok": true,
        "state": state,
        "page": page,
        "draft": draft,
    })))
}

#[derive(Debug, Deserialize)]
pub struct HtmlForm {
    pub html: String,
}

/// Best-effort autosave. A failed write leaves the session intact.
fn autosave(store: &dyn Store, page_id: i64, html: &str, username: &str) -> bool {
    match store.draft_save(page_id, html, username) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Autosave of page #{} failed: {}", page_id, e);
            false
        }
    }
}

/// Record an edit and autosave it as the page's draft.
#[post("/builder/<page_id>/snapshot", format = "json", data = "<form>")]
pub fn builder_snapshot(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    page_id: i64,
    form: Json<HtmlForm>,
) -> ApiResult {
    find_page(&**store.inner(), page_id)?;
    let state = sessions.record(editor.user.id, page_id, &form.html, Instant::now());
    let draft_saved = autosave(&**store.inner(), page_id, &form.html, &editor.user.username);
    Ok(Json(json!({"ok": true, "state": state, "draft_saved": draft_saved})))
}

/// Step back through the ring. The draft follows so a reopened editor
/// shows the same content.
#[post("/builder/<page_id>/undo")]
pub fn builder_undo(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    page_id: i64,
) -> ApiResult {
    let state = sessions
        .undo(editor.user.id, page_id)
        .ok_or_else(|| CmsError::not_found("No open builder session"))?;
    let draft_saved =
        state.moved && autosave(&**store.inner(), page_id, &state.html, &editor.user.username);
    Ok(Json(json!({"ok": true, "state": state, "draft_saved": draft_saved})))
}

#[post("/builder/<page_id>/redo")]
pub fn builder_redo(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    page_id: i64,
) -> ApiResult {
    let state = sessions
        .redo(editor.user.id, page_id)
        .ok_or_else(|| CmsError::not_found("No open builder session"))?;
    let draft_saved =
        state.moved && autosave(&**store.inner(), page_id, &state.html, &editor.user.username);
    Ok(Json(json!({"ok": true, "state": state, "draft_saved": draft_saved})))
}

/// Publish the builder content to the page and drop the draft.
#[post("/builder/<page_id>/save", format = "json", data = "<form>")]
pub fn builder_save(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    ip: ClientIp,
    page_id: i64,
    form: Json<HtmlForm>,
) -> ApiResult {
    let page = store.page_set_content(page_id, &form.html, &editor.user.username)?;
    if let Err(e) = store.draft_discard(page_id) {
        log::warn!("Could not discard draft of page #{}: {}", page_id, e);
    }
    let state = sessions.open(editor.user.id, page_id, &page.content);
    store.log_record(activity(&editor.user, &ip, "builder", "page").entity(page.id, &page.title));
    Ok(Json(json!({"ok": true, "page": page, "state": state})))
}

#[delete("/builder/<page_id>/draft")]
pub fn builder_discard(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    sessions: &State<BuilderSessions>,
    page_id: i64,
) -> ApiResult {
    let page = find_page(&**store.inner(), page_id)?;
    let discarded = store.draft_discard(page_id)?;
    let state = sessions.open(editor.user.id, page_id, &page.content);
    Ok(Json(json!({"ok": true, "discarded": discarded, "state": state})))
}

pub fn routes() -> Vec<Route> {
    routes![
        blocks_list,
        block_render,
        blocks_compose,
        builder_open,
        builder_snapshot,
        builder_undo,
        builder_redo,
        builder_save,
        builder_discard
    ]
}
