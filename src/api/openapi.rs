//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::handlers::{auth, bookings, events, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "festa",
        description = "Event booking and management service",
        license(name = "BSD-3-Clause", identifier = "BSD-3-Clause"),
        contact(name = "Team Festa", email = "team@festa.dev")
    ),
    paths(
        health::health,
        auth::register::register,
        auth::register::verify_registration,
        auth::login::login,
        auth::reset::forgot_password,
        auth::reset::verify_reset,
        auth::reset::reset_password,
        auth::reset::resend_otp,
        auth::session::session,
        auth::session::logout,
        events::list_events,
        events::get_event,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::booking_stats,
        bookings::booking_details,
        bookings::cancel_booking,
        bookings::update_booking_status,
    ),
    components(schemas(
        health::Health,
        auth::types::RegisterRequest,
        auth::types::VerifyRegistrationRequest,
        auth::types::LoginRequest,
        auth::types::ForgotPasswordRequest,
        auth::types::VerifyResetRequest,
        auth::types::ResetPasswordRequest,
        auth::types::ResendOtpRequest,
        auth::types::MessageResponse,
        auth::types::SessionUserResponse,
        events::EventResponse,
        bookings::types::BookingStatus,
        bookings::types::CreateBookingRequest,
        bookings::types::BookingResponse,
        bookings::types::BookingSummary,
        bookings::types::BookingStatsResponse,
        bookings::types::ServiceResponse,
        bookings::types::BookingDetailsResponse,
        bookings::types::UpdateStatusRequest,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login and password reset"),
        (name = "events", description = "Event catalog"),
        (name = "bookings", description = "Event bookings")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_paths_and_tags() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/v1/auth/login"));
        assert!(spec.paths.paths.contains_key("/v1/auth/verify-registration"));
        assert!(spec.paths.paths.contains_key("/v1/bookings/{id}/status"));
        assert!(spec.paths.paths.contains_key("/v1/events/{id}"));

        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "bookings"));
    }

    #[test]
    fn openapi_info_from_annotations() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "festa");
        let license = spec.info.license.clone();
        assert_eq!(license.map(|license| license.name).as_deref(), Some("BSD-3-Clause"));
    }
}
