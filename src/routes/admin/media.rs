use std::path::Path;
use std::sync::Arc;

use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::config::CmsConfig;
use crate::error::CmsError;
use crate::models::media::{is_allowed_ext, mime_for_ext};
use crate::security::auth::{ClientIp, EditorUser};
use crate::store::Store;

// ── Media Library ──────────────────────────────────────

#[get("/media")]
pub fn media_list(_editor: EditorUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let items: Vec<Value> = store
        .media_list()
        .into_iter()
        .map(|m| {
            let url = m.url();
            let is_image = m.is_image();
            let mut v = json!(m);
            v["url"] = json!(url);
            v["is_image"] = json!(is_image);
            v
        })
        .collect();
    Json(json!({
        "ok": true,
        "media": items,
        "allowed_types": store.setting_get_or("media_allowed_types", ""),
        "max_mb": store.setting_get_i64("media_max_mb"),
    }))
}

#[derive(FromForm)]
pub struct MediaUpload<'f> {
    pub file: TempFile<'f>,
    pub alt: Option<String>,
}

/// Original file name's extension, lowercased.
fn upload_ext(file: &TempFile<'_>) -> Option<String> {
    let raw = file.raw_name()?.dangerous_unsafe_unsanitized_raw().as_str().to_string();
    let ext = Path::new(&raw).extension()?.to_string_lossy().to_lowercase();
    Some(ext)
}

fn upload_name(file: &TempFile<'_>) -> String {
    file.name()
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string())
}

#[post("/media", data = "<form>")]
pub async fn media_upload(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    config: &State<CmsConfig>,
    ip: ClientIp,
    mut form: Form<MediaUpload<'_>>,
) -> ApiResult {
    let allowed = store.setting_get_or("media_allowed_types", "");
    let ext = upload_ext(&form.file).unwrap_or_default();
    if !is_allowed_ext(&ext, &allowed) {
        return Err(CmsError::invalid_fields(
            format!("File type '{}' is not allowed", ext),
            vec!["file".to_string()],
        ));
    }

    let max_mb = store.setting_get_i64("media_max_mb").max(1) as u64;
    let size = form.file.len();
    if size == 0 || size > max_mb * 1024 * 1024 {
        return Err(CmsError::invalid_fields(
            format!("Files must be between 1 byte and {} MB", max_mb),
            vec!["file".to_string()],
        ));
    }

    let filename = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    std::fs::create_dir_all(&config.uploads_dir)?;
    let dest = config.uploads_dir.join(&filename);
    form.file.move_copy_to(&dest).await?;

    let original = format!("{}.{}", upload_name(&form.file), ext);
    let item = match store.media_create(&filename, &original, mime_for_ext(&ext), size) {
        Ok(item) => item,
        Err(e) => {
            let _ = std::fs::remove_file(&dest);
            return Err(e);
        }
    };
    let item = match form.alt.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        Some(alt) => store.media_update_alt(item.id, alt)?,
        None => item,
    };

    store.log_record(activity(&editor.user, &ip, "upload", "media").entity(item.id, &item.original_name));
    let url = item.url();
    Ok(Json(json!({"ok": true, "media": item, "url": url})))
}

#[derive(Debug, Deserialize)]
pub struct AltForm {
    pub alt: String,
}

#[put("/media/<id>", format = "json", data = "<form>")]
pub fn media_update(
    _editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    id: i64,
    form: Json<AltForm>,
) -> ApiResult {
    let item = store.media_update_alt(id, &form.alt)?;
    Ok(Json(json!({"ok": true, "media": item})))
}

#[delete("/media/<id>")]
pub fn media_delete(
    editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    config: &State<CmsConfig>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    let item = store.media_delete(id)?;
    let path = config.uploads_dir.join(&item.filename);
    if let Err(e) = std::fs::remove_file(&path) {
        log::warn!("Media #{} removed but file {} could not be deleted: {}", id, path.display(), e);
    }
    store.log_record(activity(&editor.user, &ip, "delete", "media").entity(item.id, &item.original_name));
    Ok(Json(json!({"ok": true, "id": item.id})))
}

pub fn routes() -> Vec<Route> {
    routes![media_list, media_upload, media_update, media_delete]
}
