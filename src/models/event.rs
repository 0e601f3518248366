use crate::entities::events;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Intro to Rust")]
    pub title: String,
    #[schema(example = "A hands-on introduction for beginners.")]
    pub description: String,
    #[schema(example = "en")]
    pub language: String,
    #[schema(example = "Berlin")]
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[schema(example = 30)]
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// capacity 传 null 不会清空容量；容量一经设置只能改数值
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventSearchQuery {
    pub location: Option<String>,
    pub language: Option<String>,
    pub starts_after: Option<String>,
    pub starts_before: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatorResponse {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub language: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub created_by: CreatorResponse,
    pub created_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn new(event: events::Model, creator: CreatorResponse) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            language: event.language,
            location: event.location,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            capacity: event.capacity,
            created_by: creator,
            created_at: event.created_at,
        }
    }
}

/// 主办方视角的单个活动统计；available_seats 不设容量时为 null，设了容量时不会为负
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventStatsResponse {
    pub id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub total_enrollments: i64,
    pub available_seats: Option<i64>,
}
