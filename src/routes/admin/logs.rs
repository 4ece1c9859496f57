use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::security::auth::{AdminUser, ClientIp};
use crate::site::paginate;
use crate::store::Store;

const PER_PAGE: usize = 50;

// ── Activity log ───────────────────────────────────────

#[get("/logs?<action>&<entity_type>&<page>")]
pub fn logs_list(
    _admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    action: Option<&str>,
    entity_type: Option<&str>,
    page: Option<usize>,
) -> Json<Value> {
    let action = action.filter(|a| !a.is_empty());
    let entity_type = entity_type.filter(|t| !t.is_empty());
    let total = store.log_count(action, entity_type);
    let pagination = paginate(total, PER_PAGE, page);
    let entries = store.log_list(action, entity_type, PER_PAGE, pagination.offset);
    Json(json!({
        "ok": true,
        "logs": entries,
        "pagination": pagination,
    }))
}

#[delete("/logs")]
pub fn logs_clear(admin: AdminUser, store: &State<Arc<dyn Store>>, ip: ClientIp) -> ApiResult {
    let removed = store.log_clear()?;
    // The clear itself is the first entry of the fresh log.
    store.log_record(
        activity(&admin.user, &ip, "clear", "logs").details(format!("{} entries removed", removed)),
    );
    Ok(Json(json!({"ok": true, "removed": removed})))
}

pub fn routes() -> Vec<Route> {
    routes![logs_list, logs_clear]
}
