//! Auth state and configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::api::notify::OtpSender;

use super::otp::OtpStore;
use super::throttle::{LoginThrottle, DEFAULT_LOCK_WINDOW, DEFAULT_MAX_ATTEMPTS};

const DEFAULT_OTP_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    otp_ttl_seconds: u64,
    max_login_attempts: u32,
    login_window_seconds: u64,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
            max_login_attempts: DEFAULT_MAX_ATTEMPTS,
            login_window_seconds: DEFAULT_LOCK_WINDOW.as_secs(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, seconds: u64) -> Self {
        self.otp_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_login_attempts(mut self, attempts: u32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_login_window_seconds(mut self, seconds: u64) -> Self {
        self.login_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    pub(super) fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_seconds)
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration data held between the register request and OTP verification.
#[derive(Clone, Debug)]
pub(super) struct PendingRegistration {
    pub(super) username: String,
    pub(super) email: String,
    pub(super) password: String,
    pub(super) full_name: Option<String>,
    pub(super) phone: Option<String>,
    pub(super) role: String,
}

struct PendingEntry {
    registration: PendingRegistration,
    expires_at: Instant,
}

/// Shared authentication state: configuration, OTP store, login throttle,
/// OTP delivery, plus the short-lived registration/reset staging maps.
///
/// Constructed once at server start; everything in here is process-local.
pub struct AuthState {
    config: AuthConfig,
    otp_store: OtpStore,
    throttle: LoginThrottle,
    otp_sender: Arc<dyn OtpSender>,
    pending_registrations: Mutex<HashMap<String, PendingEntry>>,
    reset_grants: Mutex<HashMap<String, Instant>>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, otp_sender: Arc<dyn OtpSender>) -> Self {
        let otp_store = OtpStore::new(config.otp_ttl());
        let throttle = LoginThrottle::new(
            config.max_login_attempts,
            Duration::from_secs(config.login_window_seconds),
        );
        Self {
            config,
            otp_store,
            throttle,
            otp_sender,
            pending_registrations: Mutex::new(HashMap::new()),
            reset_grants: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn otp_store(&self) -> &OtpStore {
        &self.otp_store
    }

    pub(super) fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    pub(super) fn otp_sender(&self) -> &dyn OtpSender {
        self.otp_sender.as_ref()
    }

    /// Stage registration data until the emailed code is verified.
    /// Staged entries share the OTP validity window.
    pub(super) async fn stash_pending_registration(&self, registration: PendingRegistration) {
        let mut pending = self.pending_registrations.lock().await;
        pending.retain(|_, entry| entry.expires_at > Instant::now());
        pending.insert(
            registration.email.clone(),
            PendingEntry {
                registration,
                expires_at: Instant::now() + self.config.otp_ttl(),
            },
        );
    }

    pub(super) async fn take_pending_registration(
        &self,
        email: &str,
    ) -> Option<PendingRegistration> {
        let mut pending = self.pending_registrations.lock().await;
        let entry = pending.remove(email)?;
        if entry.expires_at > Instant::now() {
            Some(entry.registration)
        } else {
            None
        }
    }

    /// Mark `email` as allowed to reset its password after OTP verification.
    pub(super) async fn grant_reset(&self, email: &str) {
        let mut grants = self.reset_grants.lock().await;
        grants.retain(|_, expires_at| *expires_at > Instant::now());
        grants.insert(email.to_string(), Instant::now() + self.config.otp_ttl());
    }

    /// Consume the reset grant for `email`, if one is still valid.
    pub(super) async fn take_reset_grant(&self, email: &str) -> bool {
        let mut grants = self.reset_grants.lock().await;
        match grants.remove(email) {
            Some(expires_at) => expires_at > Instant::now(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::notify::LogOtpSender;

    fn state() -> AuthState {
        AuthState::new(AuthConfig::new(), Arc::new(LogOtpSender))
    }

    fn registration(email: &str) -> PendingRegistration {
        PendingRegistration {
            username: "alice".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            full_name: Some("Alice Doe".to_string()),
            phone: None,
            role: "user".to_string(),
        }
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();
        assert_eq!(config.otp_ttl(), Duration::from_secs(600));
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);

        let config = config
            .with_otp_ttl_seconds(120)
            .with_max_login_attempts(3)
            .with_login_window_seconds(60)
            .with_session_ttl_seconds(3600);

        assert_eq!(config.otp_ttl(), Duration::from_secs(120));
        assert_eq!(config.max_login_attempts, 3);
        assert_eq!(config.login_window_seconds, 60);
        assert_eq!(config.session_ttl_seconds(), 3600);
    }

    #[tokio::test]
    async fn pending_registration_is_single_take() {
        let state = state();
        state
            .stash_pending_registration(registration("a@b.com"))
            .await;

        let taken = state.take_pending_registration("a@b.com").await;
        assert_eq!(taken.map(|r| r.username), Some("alice".to_string()));
        assert!(state.take_pending_registration("a@b.com").await.is_none());
    }

    #[tokio::test]
    async fn expired_pending_registration_is_dropped() {
        let state = AuthState::new(
            AuthConfig::new().with_otp_ttl_seconds(0),
            Arc::new(LogOtpSender),
        );
        state
            .stash_pending_registration(registration("a@b.com"))
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(state.take_pending_registration("a@b.com").await.is_none());
    }

    #[tokio::test]
    async fn reset_grant_is_single_use() {
        let state = state();
        state.grant_reset("a@b.com").await;

        assert!(state.take_reset_grant("a@b.com").await);
        assert!(!state.take_reset_grant("a@b.com").await);
    }

    #[tokio::test]
    async fn missing_reset_grant_is_denied() {
        let state = state();
        assert!(!state.take_reset_grant("a@b.com").await);
    }
}
