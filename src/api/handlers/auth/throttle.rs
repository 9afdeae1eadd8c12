//! Fixed-window throttle for failed login attempts.
//!
//! Attempts are grouped by identity key: lowercased email when present,
//! otherwise the client IP. State lives in process memory only; it is a
//! short-lived throttle, not an audit log.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCK_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDecision {
    Allowed,
    TooManyAttempts,
}

struct AttemptEntry {
    count: u32,
    window_start: Instant,
    last_attempt: Instant,
}

/// Counts failed logins per key within a fixed window.
///
/// The denial rule is evaluated against the stored state before any window
/// reset, so a burst of failures followed by quiet time stays locked out
/// until the window has passed since the *last* failure, not the first.
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<String, AttemptEntry>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether an attempt for `key` may proceed.
    ///
    /// A denied attempt leaves the entry untouched. An allowed attempt may
    /// reset an expired window before the caller verifies credentials.
    pub async fn check(&self, key: &str) -> LoginDecision {
        let mut attempts = self.attempts.lock().await;

        let Some(entry) = attempts.get_mut(key) else {
            return LoginDecision::Allowed;
        };

        let now = Instant::now();

        // Denial uses the pre-reset last_attempt: lockout runs until the
        // window has elapsed since the most recent failure.
        if entry.count >= self.max_attempts
            && now.duration_since(entry.last_attempt) < self.window
        {
            return LoginDecision::TooManyAttempts;
        }

        if now.duration_since(entry.window_start) > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        LoginDecision::Allowed
    }

    /// Record a failed credential check for `key`.
    pub async fn record_failure(&self, key: &str) {
        let mut attempts = self.attempts.lock().await;
        let now = Instant::now();

        let entry = attempts.entry(key.to_string()).or_insert(AttemptEntry {
            count: 0,
            window_start: now,
            last_attempt: now,
        });

        if now.duration_since(entry.window_start) > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.last_attempt = now;
    }

    /// A successful login clears the counter entirely.
    pub async fn record_success(&self, key: &str) {
        self.attempts.lock().await.remove(key);
    }

    #[cfg(test)]
    async fn count(&self, key: &str) -> Option<u32> {
        self.attempts.lock().await.get(key).map(|entry| entry.count)
    }
}

/// Identity key for grouping attempts: lowercased email, else client IP.
#[must_use]
pub fn attempt_key(email: Option<&str>, client_ip: Option<&str>) -> String {
    match email.map(str::trim).filter(|email| !email.is_empty()) {
        Some(email) => email.to_lowercase(),
        None => client_ip.unwrap_or("unknown").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_key_is_allowed() {
        let throttle = LoginThrottle::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCK_WINDOW);
        assert_eq!(throttle.check("a@b.com").await, LoginDecision::Allowed);
    }

    #[tokio::test]
    async fn sixth_attempt_is_denied() {
        let throttle = LoginThrottle::new(5, Duration::from_secs(60));
        for _ in 0..5 {
            assert_eq!(throttle.check("a@b.com").await, LoginDecision::Allowed);
            throttle.record_failure("a@b.com").await;
        }
        // Denied before any credential check, valid or not.
        assert_eq!(
            throttle.check("a@b.com").await,
            LoginDecision::TooManyAttempts
        );
    }

    #[tokio::test]
    async fn success_clears_counter() {
        let throttle = LoginThrottle::new(5, Duration::from_secs(60));
        for _ in 0..4 {
            throttle.record_failure("a@b.com").await;
        }
        throttle.record_success("a@b.com").await;

        // Next failure starts a fresh window at count 1, not 5.
        throttle.record_failure("a@b.com").await;
        assert_eq!(throttle.count("a@b.com").await, Some(1));
        assert_eq!(throttle.check("a@b.com").await, LoginDecision::Allowed);
    }

    #[tokio::test]
    async fn lockout_extends_from_last_failure() {
        let throttle = LoginThrottle::new(5, Duration::from_millis(100));

        // Failures spread out so the window anchor is older than the window
        // while the last failure is still recent.
        for _ in 0..4 {
            throttle.record_failure("a@b.com").await;
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        throttle.record_failure("a@b.com").await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        // window_start has expired, but the last failure is < 100ms old.
        assert_eq!(
            throttle.check("a@b.com").await,
            LoginDecision::TooManyAttempts
        );
    }

    #[tokio::test]
    async fn lockout_ends_after_window_from_last_failure() {
        let throttle = LoginThrottle::new(5, Duration::from_millis(50));
        for _ in 0..5 {
            throttle.record_failure("a@b.com").await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(throttle.check("a@b.com").await, LoginDecision::Allowed);
    }

    #[tokio::test]
    async fn window_reset_zeroes_counter() {
        let throttle = LoginThrottle::new(5, Duration::from_millis(20));
        for _ in 0..3 {
            throttle.record_failure("a@b.com").await;
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        throttle.record_failure("a@b.com").await;
        assert_eq!(throttle.count("a@b.com").await, Some(1));
    }

    #[test]
    fn attempt_key_prefers_lowercased_email() {
        assert_eq!(
            attempt_key(Some(" Alice@Example.COM "), Some("1.2.3.4")),
            "alice@example.com"
        );
    }

    #[test]
    fn attempt_key_falls_back_to_ip() {
        assert_eq!(attempt_key(None, Some("1.2.3.4")), "1.2.3.4");
        assert_eq!(attempt_key(Some("  "), Some("1.2.3.4")), "1.2.3.4");
        assert_eq!(attempt_key(None, None), "unknown");
    }
}
