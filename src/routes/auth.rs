use std::path::PathBuf;
use std::sync::Arc;

use rocket::form::Form;
use rocket::http::{CookieJar, Header, Status};
use rocket::response::{self, Redirect, Responder};
use rocket::{Request, State};
use rocket_dyn_templates::Template;
use serde::Deserialize;
use serde_json::json;

use crate::models::log::NewLogEntry;
use crate::rate_limit::LoginThrottle;
use crate::security::auth::{self, AuthenticatedUser, ClientIp, UserAgent};
use crate::store::Store;
use crate::AdminSlug;

/// Wrapper that adds no-cache headers to a Template response
pub struct NoCacheTemplate(Template);

impl<'r> Responder<'r, 'static> for NoCacheTemplate {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = self.0.respond_to(req)?;
        resp.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
        resp.set_header(Header::new("Pragma", "no-cache"));
        Ok(resp)
    }
}

#[derive(Debug, FromForm, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn login_template(store: &dyn Store, slug: &AdminSlug, error: Option<&str>, username: &str) -> NoCacheTemplate {
    let context = json!({
        "admin_slug": slug.get(),
        "site_name": store.setting_get_or("site_name", "My Site"),
        "admin_theme": store.setting_get_or("admin_theme", "light"),
        "error": error,
        "username": username,
    });
    NoCacheTemplate(Template::render("admin/login", &context))
}

#[get("/login")]
pub fn login_page(
    user: Option<AuthenticatedUser>,
    store: &State<Arc<dyn Store>>,
    admin_slug: &State<AdminSlug>,
) -> Result<NoCacheTemplate, Redirect> {
    if user.is_some() {
        return Err(Redirect::to(format!("/{}", admin_slug.get())));
    }
    Ok(login_template(&**store.inner(), admin_slug, None, ""))
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    store: &State<Arc<dyn Store>>,
    admin_slug: &State<AdminSlug>,
    throttle: &State<LoginThrottle>,
    ip: ClientIp,
    ua: UserAgent,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, NoCacheTemplate> {
    let store: &dyn Store = &**store.inner();
    let max_attempts = store.setting_get_i64("login_rate_limit").max(1) as u64;
    let username = form.username.trim();

    // Check rate limit before touching credentials
    if !throttle.allowed(&ip.0, max_attempts) {
        log::warn!("Login throttled for {}", ip.0);
        return Err(login_template(
            store,
            admin_slug,
            Some("Too many login attempts. Please try again in 15 minutes."),
            username,
        ));
    }

    let user = match auth::authenticate(store, username, &form.password) {
        Some(user) => user,
        None => {
            throttle.record_failure(&ip.0);
            store.log_record(
                NewLogEntry::new(username, "login_failed", "user").ip(&ip.0),
            );
            return Err(login_template(store, admin_slug, Some("Invalid credentials"), username));
        }
    };

    let session_id = match auth::create_session(store, user.id, Some(&ip.0), ua.0.as_deref()) {
        Ok(id) => id,
        Err(e) => {
            log::error!("Session creation failed: {}", e);
            return Err(login_template(store, admin_slug, Some("Session creation failed"), username));
        }
    };
    throttle.reset(&ip.0);
    auth::set_session_cookie(cookies, &session_id, store);

    if let Err(e) = store.user_touch_last_login(user.id) {
        log::warn!("Could not record last login for {}: {}", user.username, e);
    }
    match store.session_cleanup_expired() {
        Ok(n) if n > 0 => log::info!("Removed {} expired session(s)", n),
        Ok(_) => {}
        Err(e) => log::warn!("Session cleanup failed: {}", e),
    }
    store.log_record(
        NewLogEntry::new(&user.username, "login", "user")
            .entity(user.id, &user.username)
            .ip(&ip.0),
    );

    Ok(Redirect::to(format!("/{}", admin_slug.get())))
}

#[get("/logout")]
pub fn logout(
    user: Option<AuthenticatedUser>,
    store: &State<Arc<dyn Store>>,
    admin_slug: &State<AdminSlug>,
    ip: ClientIp,
    cookies: &CookieJar<'_>,
) -> Redirect {
    auth::destroy_session(&**store.inner(), cookies);
    if let Some(AuthenticatedUser { user }) = user {
        store.log_record(
            NewLogEntry::new(&user.username, "logout", "user")
                .entity(user.id, &user.username)
                .ip(&ip.0),
        );
    }
    Redirect::to(format!("/{}/login", admin_slug.get()))
}

/// Catch-all for any /<admin_slug>/* route that failed the session guard.
/// Pages redirect to the login screen; API calls get a JSON 401 from the
/// scoped catcher instead. Signed-in users only end up here for paths that
/// do not exist. Ranked ahead of the public `/<slug>` route so a bare
/// `/<admin_slug>` still reaches the login screen.
#[get("/<path..>", rank = 4)]
pub fn admin_redirect_to_login(
    path: PathBuf,
    user: Option<AuthenticatedUser>,
    admin_slug: &State<AdminSlug>,
) -> Result<Redirect, Status> {
    if user.is_some() {
        return Err(Status::NotFound);
    }
    if path.starts_with("api") {
        return Err(Status::Unauthorized);
    }
    Ok(Redirect::to(format!("/{}/login", admin_slug.get())))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_submit, logout, admin_redirect_to_login]
}
