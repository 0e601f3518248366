use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};
use serde_json::json;

use crate::entities::Role;
use crate::handlers::enrollment::{cancel_enrollment, enroll};
use crate::models::*;
use crate::policy::require_role;
use crate::services::{EnrollmentService, EventService};

fn get_current_user(req: &HttpRequest) -> Option<CurrentUser> {
    req.extensions().get::<CurrentUser>().cloned()
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All events ordered by start time", body = [EventResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_events(event_service: web::Data<EventService>) -> Result<HttpResponse> {
    match event_service.list().await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/search",
    tag = "events",
    security(("bearer_auth" = [])),
    params(
        ("location" = Option<String>, Query, description = "Substring match on location"),
        ("language" = Option<String>, Query, description = "Substring match on language"),
        ("starts_after" = Option<String>, Query, description = "RFC3339 lower bound on start time"),
        ("starts_before" = Option<String>, Query, description = "RFC3339 upper bound on start time"),
        ("q" = Option<String>, Query, description = "Keyword matched against title and description")
    ),
    responses(
        (status = 200, description = "Matching events ordered by start time", body = [EventResponse]),
        (status = 400, description = "Invalid datetime filter")
    )
)]
pub async fn search_events(
    event_service: web::Data<EventService>,
    query: web::Query<EventSearchQuery>,
) -> Result<HttpResponse> {
    match event_service.search(query.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/mine",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own events with enrollment stats", body = [EventStatsResponse]),
        (status = 403, description = "Requires facilitator role")
    )
)]
pub async fn my_events(
    enrollment_service: web::Data<EnrollmentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let facilitator_id = match require_role(user.as_ref(), Role::Facilitator) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match enrollment_service.stats_for_facilitator(facilitator_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event detail", body = EventResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match event_service.get(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid event fields"),
        (status = 403, description = "Requires facilitator role")
    )
)]
pub async fn create_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let facilitator_id = match require_role(user.as_ref(), Role::Facilitator) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.create(facilitator_id, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 403, description = "Not the event creator"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let facilitator_id = match require_role(user.as_ref(), Role::Facilitator) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service
        .update(facilitator_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 403, description = "Not the event creator"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = get_current_user(&req);
    let facilitator_id = match require_role(user.as_ref(), Role::Facilitator) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.delete(facilitator_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Event deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn event_config(cfg: &mut web::ServiceConfig) {
    // /search 与 /mine 必须注册在 /{id} 之前
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/search", web::get().to(search_events))
            .route("/mine", web::get().to(my_events))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}", web::put().to(update_event))
            .route("/{id}", web::delete().to(delete_event))
            .route("/{id}/enroll", web::post().to(enroll))
            .route("/{id}/cancel-enrollment", web::post().to(cancel_enrollment)),
    );
}
