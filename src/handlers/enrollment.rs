use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};
use chrono::Utc;
use serde_json::json;

use crate::entities::Role;
use crate::models::*;
use crate::policy::require_role;
use crate::services::EnrollmentService;

fn get_current_user(req: &HttpRequest) -> Option<CurrentUser> {
    req.extensions().get::<CurrentUser>().cloned()
}

#[utoipa::path(
    post,
    path = "/events/{id}/enroll",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentResponse),
        (status = 403, description = "Requires seeker role"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already enrolled or capacity exceeded")
    )
)]
pub async fn enroll(
    enrollment_service: web::Data<EnrollmentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let seeker_id = match require_role(user.as_ref(), Role::Seeker) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let event_id = path.into_inner();

    match enrollment_service.enroll(seeker_id, event_id).await {
        Ok(response) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": response,
            "message": "Enrolled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events/{id}/cancel-enrollment",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Enrollment canceled", body = EnrollmentResponse),
        (status = 403, description = "Requires seeker role"),
        (status = 404, description = "Event or active enrollment not found")
    )
)]
pub async fn cancel_enrollment(
    enrollment_service: web::Data<EnrollmentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let seeker_id = match require_role(user.as_ref(), Role::Seeker) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let event_id = path.into_inner();

    match enrollment_service.cancel(seeker_id, event_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": "Enrollment canceled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/enrollments/upcoming",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrolled events that have not started yet", body = [UpcomingEnrollmentResponse]),
        (status = 403, description = "Requires seeker role")
    )
)]
pub async fn list_upcoming(
    enrollment_service: web::Data<EnrollmentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let seeker_id = match require_role(user.as_ref(), Role::Seeker) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match enrollment_service.list_upcoming(seeker_id, Utc::now()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/enrollments/past",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrolled events that already ended", body = [PastEnrollmentResponse]),
        (status = 403, description = "Requires seeker role")
    )
)]
pub async fn list_past(
    enrollment_service: web::Data<EnrollmentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let seeker_id = match require_role(user.as_ref(), Role::Seeker) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match enrollment_service.list_past(seeker_id, Utc::now()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn enrollment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/enrollments")
            .route("/upcoming", web::get().to(list_upcoming))
            .route("/past", web::get().to(list_past)),
    );
}
