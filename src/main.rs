#[macro_use]
extern crate rocket;

use std::sync::Arc;
use std::time::Duration;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::fs::FileServer;
use rocket::http::{Header, Status};
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use rocket_dyn_templates::Template;
use serde_json::{json, Value};

mod boot;
mod builder;
mod config;
mod dashboard;
mod error;
mod models;
mod rate_limit;
mod routes;
mod security;
mod site;
mod sitemap;
mod store;

#[cfg(test)]
mod tests;

use builder::{BlockRegistry, BuilderSessions};
use config::CmsConfig;
use rate_limit::LoginThrottle;
use store::{JsonStore, Store};

/// Holds the admin URL slug, read from config at startup.
/// Shared via Rocket managed state so routes, fairings, and templates can access it.
pub struct AdminSlug(pub String);

impl AdminSlug {
    pub fn get(&self) -> &str {
        &self.0
    }
}

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let slug = req.rocket().state::<AdminSlug>()
            .map(|s| s.get())
            .unwrap_or("admin");
        let prefix = format!("/{}", slug);
        if req.uri().path().starts_with(&*prefix) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

// ── Catchers ───────────────────────────────────────────

#[catch(404)]
fn not_found(req: &Request<'_>) -> Template {
    let context = match req.rocket().state::<Arc<dyn Store>>() {
        Some(store) => site::context(&**store, req.uri().path().as_str(), json!({"title": "Not found"})),
        None => json!({"title": "Not found"}),
    };
    Template::render("site/404", &context)
}

#[catch(500)]
fn server_error() -> (Status, &'static str) {
    (Status::InternalServerError, "Internal server error.")
}

fn api_error(status: Status, code: &str, message: &str) -> status::Custom<Json<Value>> {
    status::Custom(status, Json(json!({"ok": false, "error": message, "code": code})))
}

#[catch(400)]
fn api_bad_request() -> status::Custom<Json<Value>> {
    api_error(Status::BadRequest, "E_VALIDATION", "Malformed request")
}

#[catch(401)]
fn api_unauthorized() -> status::Custom<Json<Value>> {
    api_error(Status::Unauthorized, "E_UNAUTHORIZED", "Not signed in")
}

#[catch(403)]
fn api_forbidden() -> status::Custom<Json<Value>> {
    api_error(Status::Forbidden, "E_FORBIDDEN", "Not allowed")
}

#[catch(404)]
fn api_not_found() -> status::Custom<Json<Value>> {
    api_error(Status::NotFound, "E_NOT_FOUND", "Not found")
}

#[catch(422)]
fn api_unprocessable() -> status::Custom<Json<Value>> {
    api_error(Status::UnprocessableEntity, "E_VALIDATION", "Request body does not match the expected shape")
}

#[catch(500)]
fn api_server_error() -> status::Custom<Json<Value>> {
    api_error(Status::InternalServerError, "E_STORAGE", "Internal server error")
}

/// Assemble the application around an opened store. Separate from `rocket()`
/// so tests can run against a temporary data directory.
pub fn build(figment: Figment, config: CmsConfig, store: Arc<dyn Store>) -> Rocket<Build> {
    let blocks = BlockRegistry::load(&config.blocks_dir).unwrap_or_else(|e| {
        log::error!("Failed to load blocks from {}: {}", config.blocks_dir.display(), e);
        BlockRegistry::empty()
    });
    let sessions = BuilderSessions::new(
        config.undo_capacity,
        Duration::from_millis(config.undo_debounce_ms),
    );

    let admin_slug = config.admin_slug.clone();
    let admin_mount = format!("/{}", admin_slug);
    let admin_api_mount = format!("/{}/api", admin_slug);
    let uploads_dir = config.uploads_dir.clone();

    log::info!("Admin panel mounted at: {}", admin_mount);

    rocket::custom(figment)
        .manage(store)
        .manage(config)
        .manage(blocks)
        .manage(sessions)
        .manage(LoginThrottle::default())
        .manage(AdminSlug(admin_slug))
        .attach(Template::fairing())
        .attach(NoCacheAdmin)
        .mount("/static", FileServer::from("website/static"))
        .mount("/uploads", FileServer::from(uploads_dir))
        .mount("/", routes::public::routes())
        .mount(&admin_mount, routes::admin::routes())
        .mount(&admin_mount, routes::auth::routes())
        .mount(&admin_api_mount, routes::admin::api_routes())
        .register("/", catchers![not_found, server_error])
        .register(
            &admin_api_mount,
            catchers![
                api_bad_request,
                api_unauthorized,
                api_forbidden,
                api_not_found,
                api_unprocessable,
                api_server_error
            ],
        )
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let figment = rocket::Config::figment();
    let config: CmsConfig = figment
        .extract::<CmsConfig>()
        .expect("Invalid flatcms configuration")
        .normalized();

    // Boot check — verify/create directories, validate critical files
    boot::run(&config);

    let store = JsonStore::open(&config.data_dir, config.history_limit, config.log_limit)
        .expect("Failed to open data directory");
    store.seed_defaults().expect("Failed to seed default settings");
    boot::ensure_admin(&store, &config).expect("Failed to create the initial admin account");

    let store: Arc<dyn Store> = Arc::new(store);
    build(figment, config, store)
}
