use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::security::auth::hash_ip;

/// Failed login attempts are counted over this window.
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// In-memory attempt counter keyed by hashed client IP.
pub struct LoginThrottle {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
    window: Duration,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        LoginThrottle::new(LOGIN_WINDOW)
    }
}

impl LoginThrottle {
    pub fn new(window: Duration) -> Self {
        LoginThrottle {
            entries: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Whether `ip` may try again: fewer than `max_attempts` failures
    /// inside the window.
    pub fn allowed(&self, ip: &str, max_attempts: u64) -> bool {
        self.allowed_at(ip, max_attempts, Instant::now())
    }

    pub fn record_failure(&self, ip: &str) {
        self.record_failure_at(ip, Instant::now());
    }

    /// A successful login wipes the slate for that address.
    pub fn reset(&self, ip: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&hash_ip(ip));
    }

    fn allowed_at(&self, ip: &str, max_attempts: u64, now: Instant) -> bool {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let key = hash_ip(ip);
        let Some(attempts) = map.get_mut(&key) else {
            return true;
        };
        attempts.retain(|t| now.duration_since(*t) < self.window);
        if attempts.is_empty() {
            map.remove(&key);
            return true;
        }
        (attempts.len() as u64) < max_attempts.max(1)
    }

    /// Records one failure and drops every address whose attempts have
    /// all aged out of the window.
    fn record_failure_at(&self, ip: &str, now: Instant) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < self.window);
            !attempts.is_empty()
        });
        map.entry(hash_ip(ip)).or_default().push(now);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_failures() {
        let t = LoginThrottle::new(Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..3 {
            assert!(t.allowed_at("10.0.0.1", 3, now));
            t.record_failure_at("10.0.0.1", now);
        }
        assert!(!t.allowed_at("10.0.0.1", 3, now));
        assert!(t.allowed_at("10.0.0.2", 3, now));
    }

    #[test]
    fn window_expiry_and_reset() {
        let t = LoginThrottle::new(Duration::from_secs(60));
        let start = Instant::now();
        t.record_failure_at("10.0.0.1", start);
        assert!(!t.allowed_at("10.0.0.1", 1, start));
        assert!(t.allowed_at("10.0.0.1", 1, start + Duration::from_secs(61)));

        t.record_failure_at("10.0.0.1", start);
        t.reset("10.0.0.1");
        assert!(t.allowed_at("10.0.0.1", 1, start));
    }

    #[test]
    fn stale_addresses_are_pruned() {
        let t = LoginThrottle::new(Duration::from_secs(60));
        let start = Instant::now();
        for i in 0..5 {
            t.record_failure_at(&format!("10.0.1.{}", i), start);
        }
        assert_eq!(t.tracked(), 5);

        t.record_failure_at("10.0.2.1", start + Duration::from_secs(61));
        assert_eq!(t.tracked(), 1);
        assert!(t.allowed_at("10.0.1.0", 1, start + Duration::from_secs(61)));
    }
}
