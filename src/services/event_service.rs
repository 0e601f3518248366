use std::collections::HashMap;

use crate::entities::{account_entity as accounts, event_entity as events};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

#[derive(Clone)]
pub struct EventService {
    pool: DatabaseConnection,
}

impl EventService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        facilitator_id: i64,
        request: CreateEventRequest,
    ) -> AppResult<EventResponse> {
        validate_text("title", &request.title, 200)?;
        validate_text("description", &request.description, 2000)?;
        validate_text("language", &request.language, 50)?;
        validate_text("location", &request.location, 200)?;
        if request.ends_at <= request.starts_at {
            return Err(AppError::ValidationError(
                "ends_at must be after starts_at".to_string(),
            ));
        }
        if let Some(capacity) = request.capacity
            && capacity < 1
        {
            return Err(AppError::ValidationError(
                "capacity must be at least 1".to_string(),
            ));
        }

        let now = Utc::now();
        let event = events::ActiveModel {
            title: Set(request.title),
            description: Set(request.description),
            language: Set(request.language),
            location: Set(request.location),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            capacity: Set(request.capacity),
            enrolled_count: Set(0),
            created_by: Set(facilitator_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let event = event.insert(&self.pool).await?;

        self.with_creator(event).await
    }

    pub async fn get(&self, event_id: i64) -> AppResult<EventResponse> {
        let event = events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        self.with_creator(event).await
    }

    pub async fn list(&self) -> AppResult<Vec<EventResponse>> {
        let rows = events::Entity::find()
            .order_by_asc(events::Column::StartsAt)
            .all(&self.pool)
            .await?;
        self.with_creators(rows).await
    }

    /// 条件搜索，全部条件 AND 组合，按开始时间升序
    pub async fn search(&self, query: EventSearchQuery) -> AppResult<Vec<EventResponse>> {
        let mut find = events::Entity::find();

        if let Some(location) = query.location.as_deref().filter(|s| !s.trim().is_empty()) {
            find = find.filter(lower_like(events::Column::Location, location));
        }
        if let Some(language) = query.language.as_deref().filter(|s| !s.trim().is_empty()) {
            find = find.filter(lower_like(events::Column::Language, language));
        }
        if let Some(value) = query.starts_after.as_deref().filter(|s| !s.is_empty()) {
            find = find.filter(events::Column::StartsAt.gte(parse_datetime(value, "starts_after")?));
        }
        if let Some(value) = query.starts_before.as_deref().filter(|s| !s.is_empty()) {
            find =
                find.filter(events::Column::StartsAt.lte(parse_datetime(value, "starts_before")?));
        }
        if let Some(q) = query.q.as_deref().filter(|s| !s.trim().is_empty()) {
            // 关键字同时匹配标题与描述
            find = find.filter(
                Condition::any()
                    .add(lower_like(events::Column::Title, q))
                    .add(lower_like(events::Column::Description, q)),
            );
        }

        let rows = find
            .order_by_asc(events::Column::StartsAt)
            .all(&self.pool)
            .await?;
        self.with_creators(rows).await
    }

    pub async fn update(
        &self,
        facilitator_id: i64,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> AppResult<EventResponse> {
        let event = self.load_owned(facilitator_id, event_id).await?;

        if request.title.is_none()
            && request.description.is_none()
            && request.language.is_none()
            && request.location.is_none()
            && request.starts_at.is_none()
            && request.ends_at.is_none()
            && request.capacity.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        // 起止时间按更新后的组合校验
        let starts_at = request.starts_at.unwrap_or(event.starts_at);
        let ends_at = request.ends_at.unwrap_or(event.ends_at);
        if ends_at <= starts_at {
            return Err(AppError::ValidationError(
                "ends_at must be after starts_at".to_string(),
            ));
        }
        if let Some(capacity) = request.capacity
            && capacity < 1
        {
            return Err(AppError::ValidationError(
                "capacity must be at least 1".to_string(),
            ));
        }

        let mut am = event.into_active_model();
        if let Some(title) = request.title {
            validate_text("title", &title, 200)?;
            am.title = Set(title);
        }
        if let Some(description) = request.description {
            validate_text("description", &description, 2000)?;
            am.description = Set(description);
        }
        if let Some(language) = request.language {
            validate_text("language", &language, 50)?;
            am.language = Set(language);
        }
        if let Some(location) = request.location {
            validate_text("location", &location, 200)?;
            am.location = Set(location);
        }
        if let Some(starts_at) = request.starts_at {
            am.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = request.ends_at {
            am.ends_at = Set(ends_at);
        }
        if let Some(capacity) = request.capacity {
            am.capacity = Set(Some(capacity));
        }
        am.updated_at = Set(Utc::now());

        let event = am.update(&self.pool).await?;
        self.with_creator(event).await
    }

    pub async fn delete(&self, facilitator_id: i64, event_id: i64) -> AppResult<()> {
        let event = self.load_owned(facilitator_id, event_id).await?;

        // 级联删除报名记录（外键 ON DELETE CASCADE）
        events::Entity::delete_by_id(event.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_owned(&self, facilitator_id: i64, event_id: i64) -> AppResult<events::Model> {
        let event = events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if event.created_by != facilitator_id {
            return Err(AppError::Forbidden(
                "Only the event creator can modify this event".to_string(),
            ));
        }
        Ok(event)
    }

    async fn with_creator(&self, event: events::Model) -> AppResult<EventResponse> {
        let mut list = self.with_creators(vec![event]).await?;
        list.pop()
            .ok_or_else(|| AppError::InternalError("event response missing".to_string()))
    }

    async fn with_creators(&self, rows: Vec<events::Model>) -> AppResult<Vec<EventResponse>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut creator_ids: Vec<i64> = rows.iter().map(|e| e.created_by).collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();

        let creators: HashMap<i64, String> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(creator_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|a| (a.id, a.email))
            .collect();

        Ok(rows
            .into_iter()
            .map(|event| {
                let creator = CreatorResponse {
                    id: event.created_by,
                    email: creators.get(&event.created_by).cloned().unwrap_or_default(),
                };
                EventResponse::new(event, creator)
            })
            .collect())
    }
}

/// 大小写不敏感的子串匹配，postgres 与 sqlite 行为一致
fn lower_like(col: events::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.trim().to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

/// 搜索词中的 % _ \ 按字面量匹配，不再是 LIKE 通配符
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_datetime(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| AppError::ValidationError(format!("Invalid {field}, expected RFC3339 datetime")))
}

fn validate_text(field: &str, value: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!(
            "{field} must not be empty"
        )));
    }
    if value.len() > max_len {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}
