use std::collections::HashMap;

use crate::error::{CmsError, Result};
use crate::store::Store;

/// Seeded on first boot; also the list of keys editors may change.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("site_name", "My Site"),
    ("site_tagline", ""),
    ("site_url", "http://localhost:8000"),
    ("site_language", "en"),
    ("home_page_id", ""),
    ("posts_per_page", "10"),
    ("blog_title", "Blog"),
    ("events_title", "Events"),
    ("footer_text", ""),
    ("session_expiry_hours", "24"),
    ("login_rate_limit", "5"),
    ("media_allowed_types", "jpg,jpeg,png,gif,webp,svg,pdf,mp4"),
    ("media_max_mb", "10"),
    ("sitemap_enabled", "true"),
    ("robots_txt", "User-agent: *\nAllow: /"),
    ("admin_theme", "light"),
];

/// Upper bound for `media_max_mb`. Keep in step with the `file` and
/// `data-form` limits in Rocket.toml.
pub const MAX_UPLOAD_MB: i64 = 32;

pub fn is_known_key(key: &str) -> bool {
    DEFAULT_SETTINGS.iter().any(|(k, _)| *k == key)
}

/// Validated writes to `settings.json`.
///
/// Bad input surfaces as `CmsError::Validation` (HTTP 400), write failures
/// as `CmsError::Storage` (HTTP 500).
pub struct SettingsService<'a> {
    store: &'a dyn Store,
}

impl<'a> SettingsService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        SettingsService { store }
    }

    pub fn all(&self) -> HashMap<String, String> {
        self.store.setting_all()
    }

    /// Validate and persist `changes`. Returns the keys that were written.
    pub fn update(&self, changes: &HashMap<String, String>) -> Result<Vec<String>> {
        let mut clean = HashMap::new();
        let mut bad = Vec::new();

        for (key, raw) in changes {
            if !is_known_key(key) {
                return Err(CmsError::validation(format!("Unknown setting '{}'", key)));
            }
            let value = if key == "robots_txt" {
                raw.replace("\r\n", "\n")
            } else {
                raw.trim().to_string()
            };
            if self.check(key, &value).is_err() {
                bad.push(key.clone());
                continue;
            }
            clean.insert(key.clone(), value);
        }

        if !bad.is_empty() {
            bad.sort();
            return Err(CmsError::invalid_fields("Invalid settings", bad));
        }

        self.store.setting_set_many(&clean)?;
        let mut keys: Vec<String> = clean.into_keys().collect();
        keys.sort();
        Ok(keys)
    }

    fn check(&self, key: &str, value: &str) -> std::result::Result<(), ()> {
        let in_range = |v: &str, lo: i64, hi: i64| {
            v.parse::<i64>()
                .map(|n| n >= lo && n <= hi)
                .unwrap_or(false)
        };
        let ok = match key {
            "site_name" => !value.is_empty(),
            "site_url" => url::Url::parse(value)
                .map(|u| u.scheme() == "http" || u.scheme() == "https")
                .unwrap_or(false),
            "posts_per_page" => in_range(value, 1, 100),
            "session_expiry_hours" => in_range(value, 1, 24 * 365),
            "login_rate_limit" => in_range(value, 1, 1000),
            "media_max_mb" => in_range(value, 1, MAX_UPLOAD_MB),
            "sitemap_enabled" => value == "true" || value == "false",
            "admin_theme" => value == "light" || value == "dark",
            "home_page_id" => {
                value.is_empty()
                    || value
                        .parse::<i64>()
                        .ok()
                        .and_then(|id| self.store.page_find_by_id(id))
                        .is_some()
            }
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(())
        }
    }
}
