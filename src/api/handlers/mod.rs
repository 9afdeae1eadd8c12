//! Route handlers for the booking service.

pub mod auth;
pub mod bookings;
pub mod events;
pub mod health;
