use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::error::CmsError;
use crate::models::event::EventForm;
use crate::models::now;
use crate::security::auth::{ClientIp, EditorUser};
use crate::store::Store;

// ── Events ─────────────────────────────────────────────

#[get("/events?<upcoming>")]
pub fn events_list(_editor: EditorUser, store: &State<Arc<dyn Store>>, upcoming: Option<bool>) -> Json<Value> {
    let at = now();
    let events = if upcoming.unwrap_or(false) {
        store.event_upcoming(at, usize::MAX)
    } else {
        store.event_list()
    };
    let events: Vec<Value> = events
        .into_iter()
        .map(|e| {
            let is_upcoming = e.is_upcoming(at);
            let mut v = json!(e);
            v["upcoming"] = json!(is_upcoming);
            v
        })
        .collect();
    Json(json!({"ok": true, "events": events}))
}

#[get("/events/<id>")]
pub fn event_get(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let event = store
        .event_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Event not found"))?;
    Ok(Json(json!({"ok": true, "event": event})))
}

#[post("/events", format = "json", data = "<form>")]
pub fn event_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<EventForm>,
) -> ApiResult {
    let event = store.event_create(&form)?;
    store.log_record(activity(&editor.user, &ip, "create", "event").entity(event.id, &event.title));
    Ok(Json(json!({"ok": true, "event": event})))
}

#[put("/events/<id>", format = "json", data = "<form>")]
pub fn event_update(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<EventForm>,
) -> ApiResult {
    let event = store.event_update(id, &form)?;
    store.log_record(activity(&editor.user, &ip, "update", "event").entity(event.id, &event.title));
    Ok(Json(json!({"ok": true, "event": event})))
}

#[delete("/events/<id>")]
pub fn event_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let event = store.event_delete(id)?;
    store.log_record(activity(&editor.user, &ip, "delete", "event").entity(event.id, &event.title));
    Ok(Json(json!({"ok": true, "id": event.id})))
}

pub fn routes() -> Vec<Route> {
    routes![
        events_list,
        event_get,
        event_create,
        event_update,
        event_delete
    ]
}
