//! In-memory store for pending one-time codes.

use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Why a submitted code was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Code not found or expired")]
    NotFound,
    #[error("Code expired")]
    Expired,
    #[error("Invalid code")]
    Mismatch,
}

struct OtpEntry {
    code: String,
    expires_at: Instant,
}

/// Pending one-time codes keyed by normalized identity (email).
///
/// One active entry per identity; issuing a new code replaces the prior one.
/// Codes are single-use: a successful or expired verification evicts the
/// entry, a mismatch leaves it in place so the user can retry within the
/// original validity window.
pub struct OtpStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Generate and store a 6-digit code for `identity`, replacing any
    /// pending code. Returns the raw code for delivery.
    pub async fn issue(&self, identity: &str) -> String {
        let code = generate_code();
        let mut entries = self.entries.lock().await;
        entries.insert(
            identity.to_string(),
            OtpEntry {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Check `submitted` against the pending code for `identity`.
    pub async fn verify(&self, identity: &str, submitted: &str) -> Result<(), OtpError> {
        let mut entries = self.entries.lock().await;

        let entry = entries.get(identity).ok_or(OtpError::NotFound)?;

        if Instant::now() > entry.expires_at {
            entries.remove(identity);
            return Err(OtpError::Expired);
        }

        if entry.code != submitted {
            return Err(OtpError::Mismatch);
        }

        entries.remove(identity);
        Ok(())
    }
}

/// Uniformly random 6-digit numeric code.
fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.parse::<u32>().is_ok());
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[tokio::test]
    async fn verify_unknown_identity_is_not_found() {
        let store = OtpStore::new(Duration::from_secs(600));
        assert_eq!(
            store.verify("a@b.com", "123456").await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn wrong_code_does_not_consume_entry() {
        let store = OtpStore::new(Duration::from_secs(600));
        let code = store.issue("a@b.com").await;

        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert_eq!(
            store.verify("a@b.com", wrong).await,
            Err(OtpError::Mismatch)
        );

        // Entry retained: the correct code still verifies.
        assert_eq!(store.verify("a@b.com", &code).await, Ok(()));

        // Single use: the same code no longer exists.
        assert_eq!(
            store.verify("a@b.com", &code).await,
            Err(OtpError::NotFound)
        );
    }

    #[tokio::test]
    async fn reissue_invalidates_prior_code() {
        let store = OtpStore::new(Duration::from_secs(600));
        let first = store.issue("a@b.com").await;
        let second = store.issue("a@b.com").await;

        if first != second {
            assert_eq!(
                store.verify("a@b.com", &first).await,
                Err(OtpError::Mismatch)
            );
        }
        assert_eq!(store.verify("a@b.com", &second).await, Ok(()));
    }

    #[tokio::test]
    async fn expired_code_is_evicted() {
        let store = OtpStore::new(Duration::ZERO);
        let code = store.issue("a@b.com").await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            store.verify("a@b.com", &code).await,
            Err(OtpError::Expired)
        );

        // Eviction on expiry: the original code now reports NotFound.
        assert_eq!(
            store.verify("a@b.com", &code).await,
            Err(OtpError::NotFound)
        );
    }
}
