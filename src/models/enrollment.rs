use crate::entities::{enrollments, EnrollmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub event_id: i64,
    pub status: EnrollmentStatus,
}

impl From<enrollments::Model> for EnrollmentResponse {
    fn from(enrollment: enrollments::Model) -> Self {
        Self {
            event_id: enrollment.event_id,
            status: enrollment.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpcomingEnrollmentResponse {
    pub event_id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub location: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PastEnrollmentResponse {
    pub event_id: i64,
    pub title: String,
    pub ended_at: DateTime<Utc>,
}
