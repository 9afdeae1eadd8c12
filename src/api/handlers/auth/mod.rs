//! Authentication: registration with email verification, throttled login,
//! password reset, and cookie sessions.

pub mod login;
pub mod otp;
pub mod password;
pub mod register;
pub mod reset;
pub mod session;
pub mod state;
pub mod storage;
pub mod throttle;
pub mod types;

mod utils;

pub use state::{AuthConfig, AuthState};
