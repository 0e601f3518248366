use std::collections::HashMap;

use crate::entities::{enrollment_entity as enrollments, event_entity as events, EnrollmentStatus};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

#[derive(FromQueryResult)]
struct EnrollmentTally {
    event_id: i64,
    total: i64,
}

#[derive(Clone)]
pub struct EnrollmentService {
    pool: DatabaseConnection,
}

impl EnrollmentService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 报名活动。占座用条件自增实现，满员时 0 行生效，并发下不会超卖
    pub async fn enroll(&self, seeker_id: i64, event_id: i64) -> AppResult<EnrollmentResponse> {
        let txn = self.pool.begin().await?;

        let event = events::Entity::find_by_id(event_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let existing = enrollments::Entity::find()
            .filter(enrollments::Column::EventId.eq(event.id))
            .filter(enrollments::Column::SeekerId.eq(seeker_id))
            .one(&txn)
            .await?;

        if let Some(ref enrollment) = existing
            && enrollment.status == EnrollmentStatus::Enrolled
        {
            return Err(AppError::AlreadyEnrolled);
        }

        // 条件自增占座；无容量限制的活动直接通过
        let res = events::Entity::update_many()
            .col_expr(
                events::Column::EnrolledCount,
                Expr::col(events::Column::EnrolledCount).add(1),
            )
            .filter(events::Column::Id.eq(event.id))
            .filter(
                Condition::any()
                    .add(events::Column::Capacity.is_null())
                    .add(
                        Expr::col(events::Column::EnrolledCount)
                            .lt(Expr::col(events::Column::Capacity)),
                    ),
            )
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::CapacityExceeded);
        }

        let enrollment = match existing {
            Some(enrollment) => {
                // 复用已取消的行；被并发请求抢先激活时 0 行生效
                let res = enrollments::Entity::update_many()
                    .col_expr(
                        enrollments::Column::Status,
                        Expr::value(EnrollmentStatus::Enrolled),
                    )
                    .col_expr(enrollments::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(enrollments::Column::Id.eq(enrollment.id))
                    .filter(enrollments::Column::Status.eq(EnrollmentStatus::Canceled))
                    .exec(&txn)
                    .await?;
                if res.rows_affected == 0 {
                    return Err(AppError::AlreadyEnrolled);
                }

                enrollments::Entity::find_by_id(enrollment.id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError("enrollment row missing".to_string())
                    })?
            }
            None => {
                let now = Utc::now();
                let am = enrollments::ActiveModel {
                    event_id: Set(event.id),
                    seeker_id: Set(seeker_id),
                    status: Set(EnrollmentStatus::Enrolled),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                // 唯一活跃位索引兜底并发重复报名；回滚会一并撤销占座
                match am.insert(&txn).await {
                    Ok(model) => model,
                    Err(err) => {
                        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                            return Err(AppError::AlreadyEnrolled);
                        }
                        return Err(err.into());
                    }
                }
            }
        };

        txn.commit().await?;

        Ok(EnrollmentResponse::from(enrollment))
    }

    /// 取消报名并释放座位。没有活跃报名时视同不存在
    pub async fn cancel(&self, seeker_id: i64, event_id: i64) -> AppResult<EnrollmentResponse> {
        let txn = self.pool.begin().await?;

        events::Entity::find_by_id(event_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let enrollment = enrollments::Entity::find()
            .filter(enrollments::Column::EventId.eq(event_id))
            .filter(enrollments::Column::SeekerId.eq(seeker_id))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Enrolled))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Active enrollment not found".to_string()))?;

        // 条件更新，已被并发取消时 0 行生效
        let res = enrollments::Entity::update_many()
            .col_expr(
                enrollments::Column::Status,
                Expr::value(EnrollmentStatus::Canceled),
            )
            .col_expr(enrollments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(enrollments::Column::Id.eq(enrollment.id))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Enrolled))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Active enrollment not found".to_string()));
        }

        // 释放座位，计数不为负
        events::Entity::update_many()
            .col_expr(
                events::Column::EnrolledCount,
                Expr::col(events::Column::EnrolledCount).sub(1),
            )
            .filter(events::Column::Id.eq(event_id))
            .filter(events::Column::EnrolledCount.gt(0))
            .exec(&txn)
            .await?;

        let enrollment = enrollments::Entity::find_by_id(enrollment.id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InternalError("enrollment row missing".to_string()))?;

        txn.commit().await?;

        Ok(EnrollmentResponse::from(enrollment))
    }

    /// 当前报名中、尚未开始的活动，按开始时间升序。时间界限由调用方时钟判定
    pub async fn list_upcoming(
        &self,
        seeker_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<UpcomingEnrollmentResponse>> {
        let event_ids = self.active_event_ids(seeker_id).await?;
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids))
            .filter(events::Column::StartsAt.gte(now))
            .order_by_asc(events::Column::StartsAt)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|event| UpcomingEnrollmentResponse {
                event_id: event.id,
                title: event.title,
                starts_at: event.starts_at,
                location: event.location,
            })
            .collect())
    }

    /// 报名中且已结束的活动，最近结束的在前。时间界限由调用方时钟判定
    pub async fn list_past(
        &self,
        seeker_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PastEnrollmentResponse>> {
        let event_ids = self.active_event_ids(seeker_id).await?;
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids))
            .filter(events::Column::EndsAt.lt(now))
            .order_by_desc(events::Column::EndsAt)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|event| PastEnrollmentResponse {
                event_id: event.id,
                title: event.title,
                ended_at: event.ends_at,
            })
            .collect())
    }

    /// 主办方名下活动的报名统计。人数用 COUNT 聚合而非占座计数器
    pub async fn stats_for_facilitator(
        &self,
        facilitator_id: i64,
    ) -> AppResult<Vec<EventStatsResponse>> {
        let own_events = events::Entity::find()
            .filter(events::Column::CreatedBy.eq(facilitator_id))
            .order_by_asc(events::Column::StartsAt)
            .all(&self.pool)
            .await?;
        if own_events.is_empty() {
            return Ok(Vec::new());
        }

        let event_ids: Vec<i64> = own_events.iter().map(|e| e.id).collect();
        let tallies: HashMap<i64, i64> = enrollments::Entity::find()
            .select_only()
            .column(enrollments::Column::EventId)
            .column_as(enrollments::Column::Id.count(), "total")
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Enrolled))
            .filter(enrollments::Column::EventId.is_in(event_ids))
            .group_by(enrollments::Column::EventId)
            .into_model::<EnrollmentTally>()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| (t.event_id, t.total))
            .collect();

        Ok(own_events
            .into_iter()
            .map(|event| {
                let total = tallies.get(&event.id).copied().unwrap_or(0);
                let available = event.capacity.map(|cap| (cap as i64 - total).max(0));
                EventStatsResponse {
                    id: event.id,
                    title: event.title,
                    starts_at: event.starts_at,
                    capacity: event.capacity,
                    total_enrollments: total,
                    available_seats: available,
                }
            })
            .collect())
    }

    async fn active_event_ids(&self, seeker_id: i64) -> AppResult<Vec<i64>> {
        let rows = enrollments::Entity::find()
            .filter(enrollments::Column::SeekerId.eq(seeker_id))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Enrolled))
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|e| e.event_id).collect())
    }
}
