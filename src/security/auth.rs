use chrono::Duration;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::{CmsError, Result};
use crate::models::now;
use crate::models::user::{Session, User};
use crate::store::Store;

pub const SESSION_COOKIE: &str = "flatcms_session";

// ── Client IP request guard ──

/// Client address, taken from the usual proxy headers before falling back
/// to the socket peer:
///   1. X-Real-IP (nginx proxy_set_header)
///   2. X-Forwarded-For (first IP in the chain)
///   3. Rocket's client_ip()
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();

        if let Some(ip) = headers.get_one("X-Real-IP") {
            let ip = ip.trim();
            if !ip.is_empty() {
                return Outcome::Success(ClientIp(ip.to_string()));
            }
        }

        if let Some(forwarded) = headers.get_one("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }

        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

/// The request's User-Agent header, if any.
pub struct UserAgent(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserAgent {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(UserAgent(
            request.headers().get_one("User-Agent").map(str::to_string),
        ))
    }
}

// ── Authenticated user guard (any active user with a valid session) ──

pub struct AuthenticatedUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) => Outcome::Success(AuthenticatedUser { user }),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

// ── Role-specific guards ──
//
// A valid session with the wrong role fails with 403 instead of forwarding.

/// Guard: requires role = admin
pub struct AdminUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) if user.is_admin() => Outcome::Success(AdminUser { user }),
            Some(_) => Outcome::Error((Status::Forbidden, ())),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

/// Guard: requires role = admin or editor
pub struct EditorUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for EditorUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_session_user(request).await {
            Some(user) if user.is_editor_or_above() => Outcome::Success(EditorUser { user }),
            Some(_) => Outcome::Error((Status::Forbidden, ())),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

// ── Shared session resolution ──

async fn resolve_session_user(request: &Request<'_>) -> Option<User> {
    let store = request
        .guard::<&State<Arc<dyn Store>>>()
        .await
        .succeeded()?;
    let cookies = request.cookies();
    let session_id = cookies.get_private(SESSION_COOKIE)?.value().to_string();

    match store.session_get_user(&session_id) {
        Some(user) if user.is_active() => Some(user),
        _ => {
            cookies.remove_private(Cookie::from(SESSION_COOKIE));
            None
        }
    }
}

// ── Password utilities ──

pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_cost(password, bcrypt::DEFAULT_COST)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|e| CmsError::storage(format!("bcrypt: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

// ── Session management ──

/// Persist a new session for `user_id` and return its id.
pub fn create_session(
    store: &dyn Store,
    user_id: i64,
    ip: Option<&str>,
    ua: Option<&str>,
) -> Result<String> {
    let expiry_hours = store.setting_get_i64("session_expiry_hours").max(1);
    let session_id = uuid::Uuid::new_v4().to_string();
    let created_at = now();
    store.session_create(Session {
        id: session_id.clone(),
        user_id,
        ip: ip.map(hash_ip),
        user_agent: ua.map(str::to_string),
        created_at,
        expires_at: created_at + Duration::hours(expiry_hours),
    })?;
    Ok(session_id)
}

pub fn destroy_session(store: &dyn Store, cookies: &CookieJar<'_>) {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        if let Err(e) = store.session_delete(cookie.value()) {
            log::warn!("Failed to delete session: {}", e);
        }
    }
    clear_session_cookie(cookies);
}

/// Set the session cookie. `Secure` is added when the site is served over
/// HTTPS according to `site_url`.
pub fn set_session_cookie(cookies: &CookieJar<'_>, session_id: &str, store: &dyn Store) {
    let is_secure = store.setting_get_or("site_url", "").starts_with("https://");

    let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    if is_secure {
        cookie.set_secure(true);
    }
    cookies.add_private(cookie);
}

pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(SESSION_COOKIE));
}

pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check credentials. Locked accounts and unknown users both come back as
/// `None` so the caller cannot tell them apart.
pub fn authenticate(store: &dyn Store, username: &str, password: &str) -> Option<User> {
    let user = store.user_get_by_username(username)?;
    if !user.is_active() || !verify_password(password, &user.password_hash) {
        return None;
    }
    Some(user)
}
