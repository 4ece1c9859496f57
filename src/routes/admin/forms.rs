use std::sync::Arc;

use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::error::CmsError;
use crate::models::form::{submissions_to_csv, FormDefinitionForm, FIELD_KINDS};
use crate::security::auth::{ClientIp, EditorUser};
use crate::store::Store;

// ── Form definitions ───────────────────────────────────

#[get("/forms")]
pub fn forms_list(_editor: EditorUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let forms: Vec<Value> = store
        .form_list()
        .into_iter()
        .map(|f| {
            let total = store.submission_count(Some(f.id), false);
            let unread = store.submission_count(Some(f.id), true);
            let mut v = json!(f);
            v["submissions"] = json!(total);
            v["unread"] = json!(unread);
            v
        })
        .collect();
    Json(json!({"ok": true, "forms": forms, "field_kinds": FIELD_KINDS}))
}

#[get("/forms/<id>")]
pub fn form_get(_editor: EditorUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let form = store
        .form_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Form not found"))?;
    Ok(Json(json!({"ok": true, "form": form})))
}

#[post("/forms", format = "json", data = "<form>")]
pub fn form_create(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<FormDefinitionForm>,
) -> ApiResult {
    let def = store.form_create(&form)?;
    store.log_record(activity(&editor.user, &ip, "create", "form").entity(def.id, &def.name));
    Ok(Json(json!({"ok": true, "form": def})))
}

#[put("/forms/<id>", format = "json", data = "<form>")]
pub fn form_update(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<FormDefinitionForm>,
) -> ApiResult {
    let def = store.form_update(id, &form)?;
    store.log_record(activity(&editor.user, &ip, "update", "form").entity(def.id, &def.name));
    Ok(Json(json!({"ok": true, "form": def})))
}

#[delete("/forms/<id>")]
pub fn form_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let (def, dropped) = store.form_delete(id)?;
    store.log_record(
        activity(&editor.user, &ip, "delete", "form")
            .entity(def.id, &def.name)
            .details(format!("{} submission(s) removed", dropped)),
    );
    Ok(Json(json!({"ok": true, "id": def.id, "submissions_removed": dropped})))
}

// ── Submissions ────────────────────────────────────────

#[get("/forms/submissions?<form_id>")]
pub fn submissions_list(
    _editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    form_id: Option<i64>,
) -> Json<Value> {
    let forms = store.form_list();
    let subs: Vec<Value> = store
        .submission_list(form_id)
        .into_iter()
        .map(|s| {
            let form_name = forms
                .iter()
                .find(|f| f.id == s.form_id)
                .map(|f| f.name.clone());
            let mut v = json!(s);
            v["form_name"] = json!(form_name);
            v
        })
        .collect();
    Json(json!({
        "ok": true,
        "submissions": subs,
        "unread": store.submission_count(form_id, true),
    }))
}

#[post("/forms/submissions/<id>/read")]
pub fn submission_mark_read(
    _editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    id: i64,
) -> ApiResult {
    store.submission_mark_read(id)?;
    Ok(Json(json!({"ok": true, "id": id})))
}

#[delete("/forms/submissions/<id>")]
pub fn submission_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    store.submission_delete(id)?;
    store.log_record(
        activity(&editor.user, &ip, "delete", "submission").entity(id, &format!("#{}", id)),
    );
    Ok(Json(json!({"ok": true, "id": id})))
}

#[derive(Responder)]
#[response(content_type = "text/csv")]
pub struct CsvDownload {
    body: String,
    disposition: Header<'static>,
}

#[get("/forms/<id>/export.csv")]
pub fn submissions_export(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> Result<CsvDownload, CmsError> {
    let form = store
        .form_find_by_id(id)
        .ok_or_else(|| CmsError::not_found("Form not found"))?;
    let mut subs = store.submission_list(Some(id));
    subs.reverse();
    let body = submissions_to_csv(&form, &subs)?;
    store.log_record(
        activity(&editor.user, &ip, "export", "form")
            .entity(form.id, &form.name)
            .details(format!("{} row(s)", subs.len())),
    );
    Ok(CsvDownload {
        body,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}-submissions.csv\"", form.slug),
        ),
    })
}

pub fn routes() -> Vec<Route> {
    routes![
        forms_list,
        form_get,
        form_create,
        form_update,
        form_delete,
        submissions_list,
        submission_mark_read,
        submission_delete,
        submissions_export
    ]
}
