use std::collections::HashMap;
use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::models::settings::SettingsService;
use crate::security::auth::{AdminUser, ClientIp};
use crate::store::Store;

// ── Settings ───────────────────────────────────────────

#[get("/settings")]
pub fn settings_get(_admin: AdminUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let settings = SettingsService::new(&**store.inner()).all();
    let pages: Vec<Value> = store
        .page_list(Some("published"))
        .into_iter()
        .map(|p| json!({"id": p.id, "title": p.title}))
        .collect();
    Json(json!({"ok": true, "settings": settings, "pages": pages}))
}

#[put("/settings", format = "json", data = "<changes>")]
pub fn settings_update(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    changes: Json<HashMap<String, String>>,
) -> ApiResult {
    let service = SettingsService::new(&**store.inner());
    let keys = service.update(&changes)?;
    if !keys.is_empty() {
        store.log_record(
            activity(&admin.user, &ip, "update", "settings").details(keys.join(", ")),
        );
    }
    Ok(Json(json!({"ok": true, "updated": keys, "settings": service.all()})))
}

pub fn routes() -> Vec<Route> {
    routes![settings_get, settings_update]
}
