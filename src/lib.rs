//! # Festa (Event Booking Service)
//!
//! `festa` is an event-booking backend: users register and log in with
//! OTP-verified email flows, browse events, and book them with optional
//! add-on services. Administrators manage booking status transitions.
//!
//! ## Authentication
//!
//! Registration and password reset are gated by short-lived one-time codes
//! delivered out of band. Login attempts are throttled per identity key
//! (lowercased email, falling back to client IP) with a fixed 15-minute
//! window. Passwords are stored as bcrypt hashes; a legacy seeded-demo
//! credential path is kept isolated in its own scheme variant.
//!
//! ## Bookings
//!
//! Booking totals are computed server-side: event price plus the sum of the
//! selected add-on service prices. Guest count is stored for capacity
//! purposes but does not scale the total.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_app_user_agent() {
        assert!(APP_USER_AGENT.starts_with("festa/"));
    }
}
