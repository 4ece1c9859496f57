use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use rocket_dyn_templates::Template;
use serde_json::{json, Value};

use crate::dashboard::DashboardAggregator;
use crate::error::CmsError;
use crate::models::log::NewLogEntry;
use crate::models::user::User;
use crate::security::auth::{AuthenticatedUser, ClientIp, EditorUser};
use crate::store::Store;
use crate::AdminSlug;

pub mod blogs;
pub mod builder;
pub mod dashboard;
pub mod events;
pub mod forms;
pub mod logs;
pub mod media;
pub mod menus;
pub mod pages;
pub mod settings;
pub mod users;

pub type ApiResult = Result<Json<Value>, CmsError>;

/// (module name, label, admin only)
pub const MODULES: &[(&str, &str, bool)] = &[
    ("dashboard", "Dashboard", false),
    ("pages", "Pages", false),
    ("blogs", "Blog", false),
    ("events", "Events", false),
    ("menus", "Menus", false),
    ("forms", "Forms", false),
    ("media", "Media", false),
    ("users", "Users", true),
    ("settings", "Settings", true),
    ("logs", "Activity log", true),
];

/// Log entry attributed to `user` from `ip`.
pub(crate) fn activity(user: &User, ip: &ClientIp, action: &str, entity_type: &str) -> NewLogEntry {
    NewLogEntry::new(&user.username, action, entity_type).ip(&ip.0)
}

// ── SPA shell and module fragments ─────────────────────

#[get("/")]
pub fn shell(
    auth: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
) -> Template {
    let modules: Vec<Value> = MODULES
        .iter()
        .filter(|(_, _, admin_only)| !admin_only || auth.user.is_admin())
        .map(|(name, label, _)| json!({"name": name, "label": label}))
        .collect();

    let context = json!({
        "page_title": "Admin",
        "admin_slug": slug.get(),
        "settings": store.setting_all(),
        "current_user": auth.user.safe_json(),
        "modules": modules,
    });
    Template::render("admin/shell", &context)
}

/// HTML fragment for one module, loaded into the shell over AJAX.
#[get("/modules/<name>")]
pub fn module_fragment(
    auth: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    name: &str,
) -> Result<Template, Status> {
    let (_, label, admin_only) = MODULES
        .iter()
        .find(|(n, _, _)| *n == name)
        .ok_or(Status::NotFound)?;
    if *admin_only && !auth.user.is_admin() {
        return Err(Status::Forbidden);
    }

    let mut context = json!({
        "module": name,
        "label": label,
        "admin_slug": slug.get(),
        "settings": store.setting_all(),
        "current_user": auth.user.safe_json(),
    });
    if name == "dashboard" {
        context["stats"] = json!(DashboardAggregator::new(&**store.inner()).stats());
    }
    Ok(Template::render(format!("admin/modules/{}", name), &context))
}

/// Full-screen page builder for one page.
#[get("/builder/<page_id>")]
pub fn builder_screen(
    _editor: EditorUser,
    store: &State<Arc<dyn Store>>,
    slug: &State<AdminSlug>,
    page_id: i64,
) -> Option<Template> {
    let page = store.page_find_by_id(page_id)?;
    let context = json!({
        "page_title": format!("Builder: {}", page.title),
        "admin_slug": slug.get(),
        "page": page,
    });
    Some(Template::render("admin/builder", &context))
}

pub fn routes() -> Vec<Route> {
    routes![shell, module_fragment, builder_screen]
}

pub fn api_routes() -> Vec<Route> {
    let mut all = Vec::new();
    all.extend(dashboard::routes());
    all.extend(pages::routes());
    all.extend(blogs::routes());
    all.extend(events::routes());
    all.extend(menus::routes());
    all.extend(forms::routes());
    all.extend(users::routes());
    all.extend(media::routes());
    all.extend(settings::routes());
    all.extend(logs::routes());
    all.extend(builder::routes());
    all
}
