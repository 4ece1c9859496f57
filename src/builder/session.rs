use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::history::UndoRing;

/// What the editor needs after each builder call.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BuilderState {
    pub html: String,
    pub can_undo: bool,
    pub can_redo: bool,
    /// False when undo/redo had nowhere to go.
    pub moved: bool,
}

impl BuilderState {
    fn of(ring: &UndoRing, moved: bool) -> Self {
        BuilderState {
            html: ring.current().to_string(),
            can_undo: ring.can_undo(),
            can_redo: ring.can_redo(),
            moved,
        }
    }
}

/// One undo ring per (user id, page id), in memory only.
pub struct BuilderSessions {
    rings: Mutex<HashMap<(i64, i64), UndoRing>>,
    capacity: usize,
    debounce: Duration,
}

impl BuilderSessions {
    pub fn new(capacity: usize, debounce: Duration) -> Self {
        BuilderSessions {
            rings: Mutex::new(HashMap::new()),
            capacity,
            debounce,
        }
    }

    /// Start (or restart) editing `page_id` from `initial`.
    pub fn open(&self, user_id: i64, page_id: i64, initial: &str) -> BuilderState {
        let mut rings = self.rings.lock().unwrap_or_else(|e| e.into_inner());
        let ring = rings
            .entry((user_id, page_id))
            .or_insert_with(|| UndoRing::new(self.capacity, self.debounce));
        ring.reset(initial);
        BuilderState::of(ring, false)
    }

    /// Record a snapshot. A missing session is started from `html`.
    pub fn record(&self, user_id: i64, page_id: i64, html: &str, at: Instant) -> BuilderState {
        let mut rings = self.rings.lock().unwrap_or_else(|e| e.into_inner());
        let ring = rings.entry((user_id, page_id)).or_insert_with(|| {
            let mut r = UndoRing::new(self.capacity, self.debounce);
            r.reset(html);
            r
        });
        let changed = ring.record(html, at);
        BuilderState::of(ring, changed)
    }

    pub fn undo(&self, user_id: i64, page_id: i64) -> Option<BuilderState> {
        let mut rings = self.rings.lock().unwrap_or_else(|e| e.into_inner());
        let ring = rings.get_mut(&(user_id, page_id))?;
        let moved = ring.undo().is_some();
        Some(BuilderState::of(ring, moved))
    }

    pub fn redo(&self, user_id: i64, page_id: i64) -> Option<BuilderState> {
        let mut rings = self.rings.lock().unwrap_or_else(|e| e.into_inner());
        let ring = rings.get_mut(&(user_id, page_id))?;
        let moved = ring.redo().is_some();
        Some(BuilderState::of(ring, moved))
    }

    /// Drop every session on `page_id`, e.g. after the page was deleted.
    pub fn close_page(&self, page_id: i64) {
        let mut rings = self.rings.lock().unwrap_or_else(|e| e.into_inner());
        rings.retain(|(_, p), _| *p != page_id);
    }
}
