use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use crate::dashboard::DashboardAggregator;
use crate::security::auth::EditorUser;
use crate::store::Store;

// ── Dashboard ──────────────────────────────────────────

#[get("/dashboard")]
pub fn dashboard_stats(_editor: EditorUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let stats = DashboardAggregator::new(&**store.inner()).stats();
    Json(json!({"ok": true, "stats": stats}))
}

pub fn routes() -> Vec<Route> {
    routes![dashboard_stats]
}
