use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Bounded undo/redo history of HTML snapshots.
///
/// `snapshots[cursor]` is the current state. Everything after the cursor is
/// the redo tail. Records that arrive within `debounce` of the previous one
/// replace it instead of adding a step, so a burst of edits undoes as one.
#[derive(Debug, Clone)]
pub struct UndoRing {
    snapshots: VecDeque<String>,
    cursor: usize,
    capacity: usize,
    debounce: Duration,
    last_record: Option<Instant>,
}

impl UndoRing {
    pub fn new(capacity: usize, debounce: Duration) -> Self {
        UndoRing {
            snapshots: VecDeque::from(vec![String::new()]),
            cursor: 0,
            capacity: capacity.max(2),
            debounce,
            last_record: None,
        }
    }

    /// Drop all history and start over from `initial`.
    pub fn reset(&mut self, initial: &str) {
        self.snapshots.clear();
        self.snapshots.push_back(initial.to_string());
        self.cursor = 0;
        self.last_record = None;
    }

    /// Record a new state. Returns false when `snapshot` equals the current
    /// state and nothing changed.
    pub fn record(&mut self, snapshot: &str, at: Instant) -> bool {
        if self.current() == snapshot {
            return false;
        }

        if self.cursor + 1 < self.snapshots.len() {
            self.snapshots.truncate(self.cursor + 1);
            self.last_record = None;
        }

        let coalesce = self.cursor > 0
            && self
                .last_record
                .map(|prev| at.saturating_duration_since(prev) < self.debounce)
                .unwrap_or(false);

        if coalesce {
            self.snapshots[self.cursor] = snapshot.to_string();
            // A burst that ends where it started leaves no step behind.
            if self.snapshots[self.cursor - 1] == snapshot {
                self.snapshots.pop_back();
                self.cursor -= 1;
            }
        } else {
            self.snapshots.push_back(snapshot.to_string());
            if self.snapshots.len() > self.capacity {
                self.snapshots.pop_front();
            }
            self.cursor = self.snapshots.len() - 1;
        }
        self.last_record = Some(at);
        true
    }

    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.last_record = None;
        Some(self.snapshots[self.cursor].as_str())
    }

    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.last_record = None;
        Some(self.snapshots[self.cursor].as_str())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn current(&self) -> &str {
        &self.snapshots[self.cursor]
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
