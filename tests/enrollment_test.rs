mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{create_account, event_request, setup_db};
use gatherly_backend::entities::{
    enrollment_entity as enrollments, event_entity as events, EnrollmentStatus, Role,
};
use gatherly_backend::error::AppError;
use gatherly_backend::models::UpdateEventRequest;
use gatherly_backend::services::{EnrollmentService, EventService};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn test_enroll_and_counter() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let event = event_service
        .create(facilitator, event_request("Rust meetup", "Berlin", Some(2)))
        .await
        .unwrap();

    let enrollment = enrollment_service.enroll(seeker, event.id).await.unwrap();
    assert_eq!(enrollment.status, EnrollmentStatus::Enrolled);
    assert_eq!(enrollment.event_id, event.id);

    let stored = events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_count, 1);
}

#[tokio::test]
async fn test_enroll_duplicate_rejected() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let event = event_service
        .create(facilitator, event_request("Rust meetup", "Berlin", Some(5)))
        .await
        .unwrap();

    enrollment_service.enroll(seeker, event.id).await.unwrap();
    let err = enrollment_service.enroll(seeker, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyEnrolled));

    // 计数没有被第二次请求污染
    let stored = events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_count, 1);
}

#[tokio::test]
async fn test_enroll_unknown_event_not_found() {
    let db = setup_db().await;
    let enrollment_service = EnrollmentService::new(db.clone());

    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let err = enrollment_service.enroll(seeker, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_capacity_gate() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let first = create_account(&db, "first@example.com", Role::Seeker).await;
    let second = create_account(&db, "second@example.com", Role::Seeker).await;

    let event = event_service
        .create(facilitator, event_request("Tiny workshop", "Berlin", Some(1)))
        .await
        .unwrap();

    enrollment_service.enroll(first, event.id).await.unwrap();
    let err = enrollment_service.enroll(second, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded));
}

#[tokio::test]
async fn test_unlimited_capacity_never_fills() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let event = event_service
        .create(facilitator, event_request("Open lecture", "Online", None))
        .await
        .unwrap();

    for i in 0..10 {
        let seeker = create_account(&db, &format!("seeker{i}@example.com"), Role::Seeker).await;
        enrollment_service.enroll(seeker, event.id).await.unwrap();
    }

    let stored = events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_count, 10);
}

#[tokio::test]
async fn test_cancel_frees_seat_and_reuses_row() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let first = create_account(&db, "first@example.com", Role::Seeker).await;
    let second = create_account(&db, "second@example.com", Role::Seeker).await;

    let event = event_service
        .create(facilitator, event_request("Tiny workshop", "Berlin", Some(1)))
        .await
        .unwrap();

    enrollment_service.enroll(first, event.id).await.unwrap();

    let canceled = enrollment_service.cancel(first, event.id).await.unwrap();
    assert_eq!(canceled.status, EnrollmentStatus::Canceled);

    let stored = events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_count, 0);

    // 座位释放后其他人可以报名
    enrollment_service.enroll(second, event.id).await.unwrap();
    let err = enrollment_service.enroll(first, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded));

    // second 取消后 first 重新报名，复用原记录而不是新增一行
    enrollment_service.cancel(second, event.id).await.unwrap();
    enrollment_service.enroll(first, event.id).await.unwrap();

    let rows = enrollments::Entity::find()
        .filter(enrollments::Column::EventId.eq(event.id))
        .filter(enrollments::Column::SeekerId.eq(first))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let row = enrollments::Entity::find()
        .filter(enrollments::Column::EventId.eq(event.id))
        .filter(enrollments::Column::SeekerId.eq(first))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, EnrollmentStatus::Enrolled);
}

#[tokio::test]
async fn test_cancel_without_active_enrollment_not_found() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let event = event_service
        .create(facilitator, event_request("Rust meetup", "Berlin", Some(5)))
        .await
        .unwrap();

    // 从未报名
    let err = enrollment_service.cancel(seeker, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // 已取消后再次取消
    enrollment_service.enroll(seeker, event.id).await.unwrap();
    enrollment_service.cancel(seeker, event.id).await.unwrap();
    let err = enrollment_service.cancel(seeker, event.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_enrolls_never_oversell() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let event = event_service
        .create(facilitator, event_request("Hot workshop", "Berlin", Some(3)))
        .await
        .unwrap();

    let mut seekers = Vec::new();
    for i in 0..8 {
        seekers.push(create_account(&db, &format!("seeker{i}@example.com"), Role::Seeker).await);
    }

    let mut handles = Vec::new();
    for seeker in seekers {
        let svc = enrollment_service.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move { svc.enroll(seeker, event_id).await }));
    }

    let mut enrolled = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => enrolled += 1,
            Err(AppError::CapacityExceeded) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(enrolled, 3);
    assert_eq!(rejected, 5);

    let stored = events::Entity::find_by_id(event.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.enrolled_count, 3);

    let active = enrollments::Entity::find()
        .filter(enrollments::Column::EventId.eq(event.id))
        .filter(enrollments::Column::Status.eq(EnrollmentStatus::Enrolled))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(active, 3);
}

#[tokio::test]
async fn test_upcoming_and_past_lists() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let now = Utc::now();

    let mut future = event_request("Future event", "Berlin", None);
    future.starts_at = now + Duration::days(3);
    future.ends_at = now + Duration::days(3) + Duration::hours(2);

    let mut finished = event_request("Finished event", "Berlin", None);
    finished.starts_at = now - Duration::days(3);
    finished.ends_at = now - Duration::days(3) + Duration::hours(2);

    // 已开始但未结束，两个列表都不出现
    let mut running = event_request("Running event", "Berlin", None);
    running.starts_at = now - Duration::hours(1);
    running.ends_at = now + Duration::hours(1);

    let future = event_service.create(facilitator, future).await.unwrap();
    let finished = event_service.create(facilitator, finished).await.unwrap();
    let running = event_service.create(facilitator, running).await.unwrap();

    for event_id in [future.id, finished.id, running.id] {
        enrollment_service.enroll(seeker, event_id).await.unwrap();
    }

    let upcoming = enrollment_service.list_upcoming(seeker, Utc::now()).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].event_id, future.id);
    assert_eq!(upcoming[0].location, "Berlin");

    let past = enrollment_service.list_past(seeker, Utc::now()).await.unwrap();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0].event_id, finished.id);

    // 取消后不再出现在列表中
    enrollment_service.cancel(seeker, future.id).await.unwrap();
    let upcoming = enrollment_service.list_upcoming(seeker, Utc::now()).await.unwrap();
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn test_list_boundaries_at_exact_times() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let seeker = create_account(&db, "seeker@example.com", Role::Seeker).await;

    let clock = Utc.with_ymd_and_hms(2031, 3, 1, 18, 0, 0).unwrap();

    // 恰好在此刻开始
    let mut starting = event_request("Starting now", "Berlin", None);
    starting.starts_at = clock;
    starting.ends_at = clock + Duration::hours(2);

    // 恰好在此刻结束
    let mut ending = event_request("Ending now", "Berlin", None);
    ending.starts_at = clock - Duration::hours(2);
    ending.ends_at = clock;

    let starting = event_service.create(facilitator, starting).await.unwrap();
    let ending = event_service.create(facilitator, ending).await.unwrap();

    enrollment_service.enroll(seeker, starting.id).await.unwrap();
    enrollment_service.enroll(seeker, ending.id).await.unwrap();

    // starts_at >= now 含边界
    let upcoming = enrollment_service.list_upcoming(seeker, clock).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].event_id, starting.id);

    // ends_at < now 不含边界，时钟越过终点后才算过去
    let past = enrollment_service.list_past(seeker, clock).await.unwrap();
    assert!(past.is_empty());

    let past = enrollment_service
        .list_past(seeker, clock + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0].event_id, ending.id);
}

#[tokio::test]
async fn test_facilitator_stats() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let other_host = create_account(&db, "other@example.com", Role::Facilitator).await;

    let capped = event_service
        .create(facilitator, event_request("Capped event", "Berlin", Some(5)))
        .await
        .unwrap();
    let open = event_service
        .create(facilitator, event_request("Open event", "Online", None))
        .await
        .unwrap();
    event_service
        .create(other_host, event_request("Not mine", "Paris", Some(3)))
        .await
        .unwrap();

    let a = create_account(&db, "a@example.com", Role::Seeker).await;
    let b = create_account(&db, "b@example.com", Role::Seeker).await;

    enrollment_service.enroll(a, capped.id).await.unwrap();
    enrollment_service.enroll(b, capped.id).await.unwrap();
    enrollment_service.enroll(a, open.id).await.unwrap();

    // 取消的报名不计入统计
    enrollment_service.cancel(b, capped.id).await.unwrap();

    let stats = enrollment_service
        .stats_for_facilitator(facilitator)
        .await
        .unwrap();
    assert_eq!(stats.len(), 2);

    let capped_stats = stats.iter().find(|s| s.id == capped.id).unwrap();
    assert_eq!(capped_stats.total_enrollments, 1);
    assert_eq!(capped_stats.available_seats, Some(4));

    let open_stats = stats.iter().find(|s| s.id == open.id).unwrap();
    assert_eq!(open_stats.total_enrollments, 1);
    assert_eq!(open_stats.available_seats, None);
}

#[tokio::test]
async fn test_available_seats_clamped_at_zero() {
    let db = setup_db().await;
    let event_service = EventService::new(db.clone());
    let enrollment_service = EnrollmentService::new(db.clone());

    let facilitator = create_account(&db, "host@example.com", Role::Facilitator).await;
    let event = event_service
        .create(facilitator, event_request("Shrinking event", "Berlin", Some(2)))
        .await
        .unwrap();

    let a = create_account(&db, "a@example.com", Role::Seeker).await;
    let b = create_account(&db, "b@example.com", Role::Seeker).await;
    enrollment_service.enroll(a, event.id).await.unwrap();
    enrollment_service.enroll(b, event.id).await.unwrap();

    // 容量调低到报名人数以下，可用座位夹到 0 而不是负数
    event_service
        .update(
            facilitator,
            event.id,
            UpdateEventRequest {
                title: None,
                description: None,
                language: None,
                location: None,
                starts_at: None,
                ends_at: None,
                capacity: Some(1),
            },
        )
        .await
        .unwrap();

    let stats = enrollment_service
        .stats_for_facilitator(facilitator)
        .await
        .unwrap();
    assert_eq!(stats[0].total_enrollments, 2);
    assert_eq!(stats[0].available_seats, Some(0));
}
