use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::event::Event;
use crate::models::form::FormSubmission;
use crate::models::log::LogEntry;
use crate::models::now;
use crate::store::Store;

const RECENT_LOGS: usize = 8;
const RECENT_SUBMISSIONS: usize = 5;

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Counts {
    pub pages: usize,
    pub pages_published: usize,
    pub pages_draft: usize,
    pub posts: usize,
    pub posts_published: usize,
    pub posts_draft: usize,
    pub categories: usize,
    pub events: usize,
    pub events_upcoming: usize,
    pub forms: usize,
    pub submissions: usize,
    pub submissions_unread: usize,
    pub users: usize,
    pub media: usize,
}

/// A submission with its form's name, for the recent list.
#[derive(Debug, Serialize, Clone)]
pub struct RecentSubmission {
    pub id: i64,
    pub form_id: i64,
    pub form_name: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
    pub ago: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct DashboardStats {
    pub counts: Counts,
    pub media_bytes: u64,
    pub media_size: String,
    pub storage_bytes: u64,
    pub storage_size: String,
    pub last_page_update: Option<String>,
    pub next_event: Option<Event>,
    pub recent_activity: Vec<LogEntry>,
    pub recent_submissions: Vec<RecentSubmission>,
}

/// Re-derives every dashboard figure from the store on each call.
pub struct DashboardAggregator<'a> {
    store: &'a dyn Store,
}

impl<'a> DashboardAggregator<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        DashboardAggregator { store }
    }

    pub fn counts(&self, at: NaiveDateTime) -> Counts {
        let s = self.store;
        Counts {
            pages: s.page_count(None),
            pages_published: s.page_count(Some("published")),
            pages_draft: s.page_count(Some("draft")),
            posts: s.post_count(None),
            posts_published: s.post_count(Some("published")),
            posts_draft: s.post_count(Some("draft")),
            categories: s.category_list().len(),
            events: s.event_count(),
            events_upcoming: s.event_upcoming(at, usize::MAX).len(),
            forms: s.form_list().len(),
            submissions: s.submission_count(None, false),
            submissions_unread: s.submission_count(None, true),
            users: s.user_count(),
            media: s.media_list().len(),
        }
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats_at(now())
    }

    pub fn stats_at(&self, at: NaiveDateTime) -> DashboardStats {
        let media_bytes: u64 = self.store.media_list().iter().map(|m| m.size).sum();
        let storage_bytes = self.store.storage_bytes();

        let last_page_update = self
            .store
            .page_list(None)
            .iter()
            .map(|p| p.updated_at)
            .max()
            .map(|t| time_ago(t, at));

        let next_event = self.store.event_upcoming(at, 1).into_iter().next();

        let recent_activity = self.store.log_list(None, None, RECENT_LOGS, 0);
        let forms = self.store.form_list();
        let recent_submissions = self
            .store
            .submission_list(None)
            .into_iter()
            .take(RECENT_SUBMISSIONS)
            .map(|s: FormSubmission| RecentSubmission {
                form_name: forms
                    .iter()
                    .find(|f| f.id == s.form_id)
                    .map(|f| f.name.clone())
                    .unwrap_or_else(|| "(deleted form)".to_string()),
                id: s.id,
                form_id: s.form_id,
                read: s.read,
                ago: time_ago(s.created_at, at),
                created_at: s.created_at,
            })
            .collect();

        DashboardStats {
            counts: self.counts(at),
            media_bytes,
            media_size: human_bytes(media_bytes),
            storage_bytes,
            storage_size: human_bytes(storage_bytes),
            last_page_update,
            next_event,
            recent_activity,
            recent_submissions,
        }
    }
}

/// `512 B`, `1.5 KB`, `3.2 MB`, ... (1024 based).
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// "just now", "5 minutes ago", "1 day ago", ... Future times read as "just now".
pub fn time_ago(then: NaiveDateTime, at: NaiveDateTime) -> String {
    let secs = (at - then).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let (n, unit) = match secs {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 86_400 * 30 => (s / 86_400, "day"),
        s if s < 86_400 * 365 => (s / (86_400 * 30), "month"),
        s => (s / (86_400 * 365), "year"),
    };
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
