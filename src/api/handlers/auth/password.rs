//! Credential verification schemes.

/// Cost factor used when hashing new passwords.
pub const BCRYPT_COST: u32 = 10;

/// Fixed hash carried by seeded demo accounts. Matching against it bypasses
/// bcrypt and requires the shared demo plaintext instead. Kept for seed-data
/// compatibility and isolated here so it can be removed in one place.
const SEEDED_DEMO_HASH: &str = "$2a$10$N9qo8uLOickgx2ZMRZoMye7Z7JYwYQzBm6vP8pZc3nJ3JYwYQzBm6v";
const SEEDED_DEMO_PASSWORD: &str = "admin123";

/// How a stored password record is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialScheme {
    /// Legacy seeded demo account with the shared fixed hash.
    SeededDemo,
    /// Standard bcrypt hash comparison.
    Bcrypt { hash: String },
}

impl CredentialScheme {
    /// Classify a stored password record.
    #[must_use]
    pub fn from_stored(stored: &str) -> Self {
        if stored == SEEDED_DEMO_HASH {
            Self::SeededDemo
        } else {
            Self::Bcrypt {
                hash: stored.to_string(),
            }
        }
    }

    /// Check a submitted plaintext against this scheme. The plaintext is
    /// never logged or retained beyond this call.
    #[must_use]
    pub fn verify(&self, submitted: &str) -> bool {
        match self {
            Self::SeededDemo => submitted == SEEDED_DEMO_PASSWORD,
            Self::Bcrypt { hash } => bcrypt::verify(submitted, hash).unwrap_or(false),
        }
    }
}

/// Hash a new password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Registration/reset password policy: at least 6 characters.
#[must_use]
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_demo_hash_is_classified() {
        assert_eq!(
            CredentialScheme::from_stored(SEEDED_DEMO_HASH),
            CredentialScheme::SeededDemo
        );
    }

    #[test]
    fn other_hashes_use_bcrypt() {
        let scheme = CredentialScheme::from_stored("$2b$10$abcdefghijklmnopqrstuv");
        assert!(matches!(scheme, CredentialScheme::Bcrypt { .. }));
    }

    #[test]
    fn seeded_demo_requires_fixed_plaintext() {
        let scheme = CredentialScheme::SeededDemo;
        assert!(scheme.verify("admin123"));
        assert!(!scheme.verify("admin1234"));
        assert!(!scheme.verify(""));
    }

    #[test]
    fn bcrypt_round_trip() {
        let hash = hash_password("hunter22").expect("hash");
        let scheme = CredentialScheme::from_stored(&hash);
        assert!(scheme.verify("hunter22"));
        assert!(!scheme.verify("hunter23"));
    }

    #[test]
    fn bcrypt_invalid_hash_is_rejected_not_fatal() {
        let scheme = CredentialScheme::Bcrypt {
            hash: "not-a-bcrypt-hash".to_string(),
        };
        assert!(!scheme.verify("anything"));
    }

    #[test]
    fn password_policy_minimum_length() {
        assert!(valid_password("abcdef"));
        assert!(valid_password("abcdefg"));
        assert!(!valid_password("abcde"));
        assert!(!valid_password(""));
    }
}
