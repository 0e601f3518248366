use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{EnrollmentStatus, Role};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::verify_email,
        handlers::auth::resend_otp,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::event::list_events,
        handlers::event::search_events,
        handlers::event::my_events,
        handlers::event::get_event,
        handlers::event::create_event,
        handlers::event::update_event,
        handlers::event::delete_event,
        handlers::enrollment::enroll,
        handlers::enrollment::cancel_enrollment,
        handlers::enrollment::list_upcoming,
        handlers::enrollment::list_past,
    ),
    components(
        schemas(
            SignupRequest,
            VerifyEmailRequest,
            ResendOtpRequest,
            LoginRequest,
            AccountResponse,
            AuthResponse,
            Role,
            CreateEventRequest,
            UpdateEventRequest,
            EventSearchQuery,
            CreatorResponse,
            EventResponse,
            EventStatsResponse,
            EnrollmentResponse,
            EnrollmentStatus,
            UpcomingEnrollmentResponse,
            PastEnrollmentResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Account signup, verification and login API"),
        (name = "events", description = "Event catalog API"),
        (name = "enrollments", description = "Event enrollment API"),
    ),
    info(
        title = "Gatherly Backend API",
        version = "1.0.0",
        description = "Event registration backend REST API documentation",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
