use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{activity, ApiResult};
use crate::error::CmsError;
use crate::models::user::{UserForm, MIN_PASSWORD_LEN, ROLES};
use crate::security::auth::{self, AdminUser, AuthenticatedUser, ClientIp};
use crate::store::Store;

// ── Users Management ─────────────────────────────────────────

#[get("/users")]
pub fn users_list(admin: AdminUser, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let users: Vec<Value> = store.user_list().iter().map(|u| u.safe_json()).collect();
    Json(json!({
        "ok": true,
        "users": users,
        "roles": ROLES,
        "current_user_id": admin.user.id,
    }))
}

#[get("/users/<id>")]
pub fn user_get(_admin: AdminUser, store: &State<Arc<dyn Store>>, id: i64) -> ApiResult {
    let user = store
        .user_get_by_id(id)
        .ok_or_else(|| CmsError::not_found("User not found"))?;
    Ok(Json(json!({"ok": true, "user": user.safe_json()})))
}

#[post("/users", format = "json", data = "<form>")]
pub fn user_create(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    form: Json<UserForm>,
) -> ApiResult {
    form.validate(true)?;
    let password = form.password.as_deref().unwrap_or_default();
    let hash = auth::hash_password(password)?;
    let user = store.user_create(&form, &hash)?;
    store.log_record(
        activity(&admin.user, &ip, "create", "user")
            .entity(user.id, &user.username)
            .details(format!("role: {}", user.role)),
    );
    Ok(Json(json!({"ok": true, "user": user.safe_json()})))
}

#[put("/users/<id>", format = "json", data = "<form>")]
pub fn user_update(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<UserForm>,
) -> ApiResult {
    form.validate(false)?;
    if id == admin.user.id && (form.role != "admin" || form.status != "active") {
        return Err(CmsError::conflict("You cannot demote or lock your own account"));
    }
    let user = store.user_update(id, &form)?;
    store.log_record(
        activity(&admin.user, &ip, "update", "user")
            .entity(user.id, &user.username)
            .details(format!("role: {}, status: {}", user.role, user.status)),
    );
    Ok(Json(json!({"ok": true, "user": user.safe_json()})))
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
    /// Required when changing your own password.
    #[serde(default)]
    pub current_password: Option<String>,
}

/// Admins may set anyone's password; everyone else only their own, and
/// only with the current one.
#[put("/users/<id>/password", format = "json", data = "<form>")]
pub fn user_password(
    auth_user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
    form: Json<PasswordForm>,
) -> ApiResult {
    let me = &auth_user.user;
    if id != me.id && !me.is_admin() {
        return Err(CmsError::Forbidden("Not allowed".to_string()));
    }
    if id == me.id {
        let current = form.current_password.as_deref().unwrap_or_default();
        if !auth::verify_password(current, &me.password_hash) {
            return Err(CmsError::invalid_fields(
                "Current password is incorrect",
                vec!["current_password".to_string()],
            ));
        }
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        return Err(CmsError::invalid_fields(
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            vec!["password".to_string()],
        ));
    }
    let target = store
        .user_get_by_id(id)
        .ok_or_else(|| CmsError::not_found("User not found"))?;
    let hash = auth::hash_password(&form.password)?;
    store.user_update_password(id, &hash)?;
    store.log_record(
        activity(me, &ip, "password", "user").entity(target.id, &target.username),
    );
    Ok(Json(json!({"ok": true})))
}

#[delete("/users/<id>")]
pub fn user_delete(
    admin: AdminUser,
    store: &State<Arc<dyn Store>>,
    ip: ClientIp,
    id: i64,
) -> ApiResult {
    if id == admin.user.id {
        return Err(CmsError::conflict("You cannot delete yourself"));
    }
    let user = store.user_delete(id)?;
    store.log_record(activity(&admin.user, &ip, "delete", "user").entity(user.id, &user.username));
    Ok(Json(json!({"ok": true, "id": user.id})))
}

pub fn routes() -> Vec<Route> {
    routes![
        users_list,
        user_get,
        user_create,
        user_update,
        user_password,
        user_delete
    ]
}
