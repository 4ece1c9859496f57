use chrono::{NaiveDateTime, SubsecRound};

pub mod blog;
pub mod draft;
pub mod event;
pub mod form;
pub mod history;
pub mod log;
pub mod media;
pub mod menu;
pub mod page;
pub mod settings;
pub mod user;

/// Slugs that would shadow a public or admin route.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin",
    "blog",
    "events",
    "forms",
    "static",
    "uploads",
    "sitemap.xml",
    "robots.txt",
];

/// Every record stored in a JSON array carries a numeric id.
pub trait Record {
    fn id(&self) -> i64;
}

/// Next id for a record array: `max + 1`, starting at 1.
pub fn next_id<T: Record>(items: &[T]) -> i64 {
    items.iter().map(Record::id).max().unwrap_or(0) + 1
}

/// Current UTC time, whole seconds. Stored timestamps stay parseable by the
/// template `date` filter.
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc().trunc_subsecs(0)
}

/// Parse the `datetime-local` input format, with or without seconds.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Slugify `wanted` (falling back to `title`) and append `-2`, `-3`, ...
/// until `taken` no longer reports a collision.
pub fn unique_slug(wanted: &str, title: &str, taken: impl Fn(&str) -> bool) -> String {
    let source = if wanted.trim().is_empty() { title } else { wanted };
    let mut base = slug::slugify(source);
    if base.is_empty() {
        base = "untitled".to_string();
    }
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.iter().any(|r| r.eq_ignore_ascii_case(slug))
}

/// Empty or whitespace-only optional strings become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}
