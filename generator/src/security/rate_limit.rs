//! Fixed-window request counter keyed by an arbitrary identifier.
//!
//! Construct one limiter and share it behind an `Arc`; the window map is
//! guarded by a mutex. Entries are never dropped on their own, call
//! [`RateLimiter::purge_expired`] from long-running hosts.

use crate::config::GeneratorConfig;
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl Default for RateLimiter {
    /// Ten requests per minute.
    fn default() -> Self {
        Self::new(10, Duration::from_millis(60_000))
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Uses `rate_limit_max` and `rate_limit_window` from the config.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.rate_limit_max, config.rate_limit_window)
    }

    pub fn allow(&self, identifier: &str) -> bool {
        self.allow_at(identifier, Instant::now())
    }

    /// Records one attempt at `now` and reports whether it is allowed.
    ///
    /// The first attempt opens a window. Inside an open window attempts are
    /// allowed until `max_requests` is reached. Once `now` is strictly past
    /// the reset time, the window restarts with this attempt counted as one.
    pub fn allow_at(&self, identifier: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = Window {
            count: 1,
            reset_at: now + self.window,
        };
        let Some(entry) = windows.get_mut(identifier) else {
            windows.insert(identifier.to_string(), fresh);
            return true;
        };
        if now > entry.reset_at {
            *entry = fresh;
            return true;
        }
        if entry.count >= self.max_requests {
            debug!("rate limit hit for {}", identifier);
            return false;
        }
        entry.count += 1;
        true
    }

    /// Attempts counted in the identifier's current window.
    pub fn count(&self, identifier: &str) -> Option<u32> {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        windows.get(identifier).map(|w| w.count)
    }

    /// Drops every window whose reset time has passed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn from_config_uses_configured_window() {
        let config = GeneratorConfig {
            rate_limit_max: 2,
            rate_limit_window: Duration::from_millis(500),
            ..GeneratorConfig::default()
        };
        let limiter = RateLimiter::from_config(&config);
        let start = Instant::now();
        assert!(limiter.allow_at("user", start));
        assert!(limiter.allow_at("user", start));
        assert!(!limiter.allow_at("user", start));
        assert!(limiter.allow_at("user", start + Duration::from_millis(501)));
    }

    #[test]
    fn denies_after_max_then_resets_after_window() {
        let limiter = RateLimiter::new(3, Duration::from_millis(1000));
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow_at("user", start));
        }
        assert!(!limiter.allow_at("user", start + Duration::from_millis(500)));
        assert_eq!(limiter.count("user"), Some(3));

        // Exactly at the reset time the window is still active.
        assert!(!limiter.allow_at("user", start + Duration::from_millis(1000)));

        assert!(limiter.allow_at("user", start + Duration::from_millis(1001)));
        assert_eq!(limiter.count("user"), Some(1));
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[test]
    fn purge_removes_only_stale_windows() {
        let limiter = RateLimiter::new(5, Duration::from_millis(100));
        let start = Instant::now();
        limiter.allow_at("old", start);
        limiter.allow_at("new", start + Duration::from_millis(150));

        assert_eq!(limiter.purge_expired(start + Duration::from_millis(200)), 1);
        assert_eq!(limiter.count("old"), None);
        assert_eq!(limiter.count("new"), Some(1));
    }

    #[test]
    fn shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(60)));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || (0..5).filter(|_| limiter.allow("shared")).count())
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 10);
    }
}
