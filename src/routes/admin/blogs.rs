use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::error::CmsError;
use crate::models::blog::{category_counts, BlogPostForm};
use crate::security::auth::{ClientIp, EditorUser};
use crate::store::Store;

// ── Posts ──────────────────────────────────────────────

#[get("/posts?<status>&<category>")]
pub fn posts_list(
    _editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    status: Option<&str>,
    category: Option<&str>,
) -> Json<Value> {
    let status = status.filter(|s| !s.is_empty());
    let category = category.filter(|c| !c.is_empty());
    let posts = store.post_list(status, category);
    Json(json!({
        "ok": true,
        "posts": posts,
        "count_all": store.post_count(None),
        "count_published": store.post_count(Some("published")),
        "count_draft": store.post_count(Some("draft")),
    }))
}

#[get("/posts/<id>")]
pub fn post_get(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let post = store
        .post_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Post not found"))?;
    Ok(Json(json!({"ok": true, "post": post})))
}

#[post("/posts", format = "json", data = "<form>")]
pub fn post_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<BlogPostForm>,
) -> ApiResult {
    let post = store.post_create(&form, editor.user.name())?;
    store.log_record(activity(&editor.user, &ip, "create", "post").entity(post.id, &post.title));
    Ok(Json(json!({"ok": true, "post": post})))
}

#[put("/posts/<id>", format = "json", data = "<form>")]
pub fn post_update(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<BlogPostForm>,
) -> ApiResult {
    let post = store.post_update(id, &form)?;
    store.log_record(activity(&editor.user, &ip, "update", "post").entity(post.id, &post.title));
    Ok(Json(json!({"ok": true, "post": post})))
}

#[delete("/posts/<id>")]
pub fn post_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let post = store.post_delete(id)?;
    store.log_record(activity(&editor.user, &ip, "delete", "post").entity(post.id, &post.title));
    Ok(Json(json!({"ok": true, "id": post.id})))
}

// ── Categories ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

/// Stored categories with post counts, plus names only found on posts.
#[get("/categories")]
pub fn categories_list(_editor: EditorUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let counts = category_counts(&store.category_list(), &store.post_list(None, None));
    Json(json!({"ok": true, "categories": counts}))
}

#[post("/categories", format = "json", data = "<form>")]
pub fn category_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<CategoryForm>,
) -> ApiResult {
    let cat = store.category_create(&form.name)?;
    store.log_record(activity(&editor.user, &ip, "create", "category").entity(cat.id, &cat.name));
    Ok(Json(json!({"ok": true, "category": cat})))
}

#[put("/categories/<id>", format = "json", data = "<form>")]
pub fn category_rename(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<CategoryForm>,
) -> ApiResult {
    let moved = store.category_rename(id, &form.name)?;
    store.log_record(
        activity(&editor.user, &ip, "rename", "category")
            .entity(id, form.name.trim())
            .details(format!("{} post(s) moved", moved)),
    );
    Ok(Json(json!({"ok": true, "posts_updated": moved})))
}

#[delete("/categories/<id>")]
pub fn category_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let name = store
        .category_find_by_id(id)
        .map(|c| c.name)
        .unwrap_or_default();
    let cleared = store.category_delete(id)?;
    store.log_record(
        activity(&editor.user, &ip, "delete", "category")
            .entity(id, &name)
            .details(format!("{} post(s) uncategorized", cleared)),
    );
    Ok(Json(json!({"ok": true, "posts_updated": cleared})))
}

pub fn routes() -> Vec<Route> {
    routes![
        posts_list,
        post_get,
        post_create,
        post_update,
        post_delete,
        categories_list,
        category_create,
        category_rename,
        category_delete
    ]
}
