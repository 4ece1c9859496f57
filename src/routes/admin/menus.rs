use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::error::CmsError;
use crate::models::menu::MenuForm;
use crate::security::auth::{ClientIp, EditorUser};
use crate::site::MENU_LOCATIONS;
use crate::store::Store;

// ── Menus ──────────────────────────────────────────────

#[get("/menus")]
pub fn menus_list(_editor: EditorUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let pages: Vec<Value> = store
        .page_list(None)
        .into_iter()
        .map(|p| json!({"id": p.id, "title": p.title, "status": p.status}))
        .collect();
    Json(json!({
        "ok": true,
        "menus": store.menu_list(),
        "locations": MENU_LOCATIONS,
        "pages": pages,
    }))
}

#[get("/menus/<id>")]
pub fn menu_get(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let menu = store
        .menu_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Menu not found"))?;
    Ok(Json(json!({"ok": true, "menu": menu})))
}

#[post("/menus", format = "json", data = "<form>")]
pub fn menu_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<MenuForm>,
) -> ApiResult {
    let menu = store.menu_create(&form)?;
    store.log_record(activity(&editor.user, &ip, "create", "menu").entity(menu.id, &menu.name));
    Ok(Json(json!({"ok": true, "menu": menu})))
}

#[put("/menus/<id>", format = "json", data = "<form>")]
pub fn menu_update(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<MenuForm>,
) -> ApiResult {
    let menu = store.menu_update(id, &form)?;
    store.log_record(activity(&editor.user, &ip, "update", "menu").entity(menu.id, &menu.name));
    Ok(Json(json!({"ok": true, "menu": menu})))
}

#[delete("/menus/<id>")]
pub fn menu_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let menu = store.menu_delete(id)?;
    store.log_record(activity(&editor.user, &ip, "delete", "menu").entity(menu.id, &menu.name));
    Ok(Json(json!({"ok": true, "id": menu.id})))
}

pub fn routes() -> Vec<Route> {
    routes![
        menus_list,
        menu_get,
        menu_create,
        menu_update,
        menu_delete
    ]
}
