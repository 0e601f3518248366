mod common;

use chrono::{Duration, Utc};
use common::{create_account, event_request, setup_db};
use gatherly_backend::entities::{enrollment_entity as enrollments, Role};
use gatherly_backend::error::AppError;
use gatherly_backend::models::{EventSearchQuery, UpdateEventRequest};
use gatherly_backend::services::{EnrollmentService, EventService};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn blank_query() -> EventSearchQuery {
    EventSearchQuery {
        location: None,
        language: None,
        starts_after: None,
        starts_before: None,
        q: None,
    }
}

fn blank_update() -> UpdateEventRequest {
    UpdateEventRequest {
        title: None,
        description: None,
        language: None,
        location: None,
        starts_at: None,
        ends_at: None,
        capacity: None,
    }
}

#[tokio::test]
async fn test_create_validation() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());
    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;

    let mut request = event_request("   ", "Berlin", None);
    let err = service.create(facilitator, request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    request = event_request("Rust meetup", "Berlin", None);
    request.description = "   ".to_string();
    let err = service.create(facilitator, request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    request = event_request("Rust meetup", "Berlin", Some(0));
    let err = service.create(facilitator, request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    request = event_request("Rust meetup", "Berlin", None);
    request.ends_at = request.starts_at;
    let err = service.create(facilitator, request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_get_unknown_event_not_found() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());

    let err = service.get(424242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_orders_by_start_time() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());
    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;

    let now = Utc::now();
    let mut late = event_request("Late event", "Berlin", None);
    late.starts_at = now + Duration::days(30);
    late.ends_at = late.starts_at + Duration::hours(2);

    let mut early = event_request("Early event", "Berlin", None);
    early.starts_at = now + Duration::days(1);
    early.ends_at = early.starts_at + Duration::hours(2);

    // 故意先建晚的活动，验证列表按开始时间重排
    service.create(facilitator, late).await.unwrap();
    service.create(facilitator, early).await.unwrap();

    let listed = service.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "Early event");
    assert_eq!(listed[1].title, "Late event");
    assert_eq!(listed[0].created_by.email, "host@example.com");
}

#[tokio::test]
async fn test_search_filters_combine() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());
    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;

    let now = Utc::now();

    let mut berlin_rust = event_request("Rust Meetup", "Berlin Mitte", None);
    berlin_rust.description = "Monthly systems programming night".to_string();
    berlin_rust.starts_at = now + Duration::days(2);
    berlin_rust.ends_at = berlin_rust.starts_at + Duration::hours(2);

    let mut berlin_cooking = event_request("Cooking Class", "Berlin Kreuzberg", None);
    berlin_cooking.description = "Hands-on pasta workshop".to_string();
    berlin_cooking.language = "de".to_string();
    berlin_cooking.starts_at = now + Duration::days(5);
    berlin_cooking.ends_at = berlin_cooking.starts_at + Duration::hours(2);

    let mut paris_rust = event_request("Atelier Rust", "Paris", None);
    paris_rust.description = "Soirée systems programming".to_string();
    paris_rust.language = "fr".to_string();
    paris_rust.starts_at = now + Duration::days(9);
    paris_rust.ends_at = paris_rust.starts_at + Duration::hours(2);

    service.create(facilitator, berlin_rust).await.unwrap();
    service.create(facilitator, berlin_cooking).await.unwrap();
    service.create(facilitator, paris_rust).await.unwrap();

    // 地点子串匹配大小写不敏感
    let found = service
        .search(EventSearchQuery {
            location: Some("berlin".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title, "Rust Meetup");
    assert_eq!(found[1].title, "Cooking Class");

    // 关键字同时命中标题与描述
    let found = service
        .search(EventSearchQuery {
            q: Some("RUST".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    let found = service
        .search(EventSearchQuery {
            q: Some("systems programming".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    // 条件 AND 组合
    let found = service
        .search(EventSearchQuery {
            location: Some("berlin".to_string()),
            q: Some("rust".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Rust Meetup");

    let found = service
        .search(EventSearchQuery {
            language: Some("fr".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Atelier Rust");

    // 时间范围
    let found = service
        .search(EventSearchQuery {
            starts_after: Some((now + Duration::days(3)).to_rfc3339()),
            starts_before: Some((now + Duration::days(7)).to_rfc3339()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Cooking Class");

    // 空白条件视同未提供
    let found = service
        .search(EventSearchQuery {
            location: Some("   ".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 3);

    let err = service
        .search(EventSearchQuery {
            starts_after: Some("yesterday".to_string()),
            ..blank_query()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_search_wildcards_match_literally() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());
    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;

    let mut pure = event_request("100% Rust", "Berlin", None);
    pure.description = "No other languages in sight".to_string();
    let mut streak = event_request("100 Days of Code", "Berlin", None);
    streak.description = "Daily practice group".to_string();

    service.create(facilitator, pure).await.unwrap();
    service.create(facilitator, streak).await.unwrap();

    // % 只命中字面上的百分号，不吞掉后续字符
    let found = service
        .search(EventSearchQuery {
            q: Some("100%".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "100% Rust");

    // _ 不匹配任意单字符，"r_st" 不命中 "Rust"
    let found = service
        .search(EventSearchQuery {
            q: Some("r_st".to_string()),
            ..blank_query()
        })
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_update_partial_and_ownership() {
    let db = setup_db().await;
    let service = EventService::new(db.clone());
    let owner = create_account(&db, "owner@example.com", Role::Facilitator).await;
    let outsider = create_account(&db, "outsider@example.com", Role::Facilitator).await;

    let event = service
        .create(owner, event_request("Rust meetup", "Berlin", Some(10)))
        .await
        .unwrap();

    let updated = service
        .update(
            owner,
            event.id,
            UpdateEventRequest {
                location: Some("Munich".to_string()),
                ..blank_update()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.location, "Munich");
    // 未提交的字段保持原值
    assert_eq!(updated.title, "Rust meetup");
    assert_eq!(updated.capacity, Some(10));

    let err = service
        .update(
            outsider,
            event.id,
            UpdateEventRequest {
                title: Some("Hijacked".to_string()),
                ..blank_update()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = service.update(owner, event.id, blank_update()).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    // 提交的文本字段同样要求非空
    let err = service
        .update(
            owner,
            event.id,
            UpdateEventRequest {
                description: Some("   ".to_string()),
                ..blank_update()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = service
        .update(
            owner,
            9999,
            UpdateEventRequest {
                title: Some("Ghost".to_string()),
                ..blank_update()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // 只改开始时间也要和现有结束时间组合校验
    let err = service
        .update(
            owner,
            event.id,
            UpdateEventRequest {
                starts_at: Some(event.ends_at + Duration::hours(1)),
                ..blank_update()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_delete_cascades_enrollments() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let owner = create_account(&db, "owner@example.com", Role::Facilitator).await;
    let outsider = create_account(&db, "outsider@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let event = event_service
        .create(owner, event_request("Rust meetup", "Berlin", Some(10)))
        .await
        .unwrap();
    enrollment_service.enroll(seeker, event.id).await.unwrap();

    let err = event_service.delete(outsider, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    event_service.delete(owner, event.id).await.unwrap();

    let err = event_service.get(event.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let remaining = enrollments::Entity::find()
        .filter(enrollments::Column::EventId.eq(event.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
