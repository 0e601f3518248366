#![allow(dead_code)]

use chrono::{Duration, Utc};
use gatherly_backend::database::DbPool;
use gatherly_backend::entities::{account_entity as accounts, Role};
use gatherly_backend::models::CreateEventRequest;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};

/// 单连接内存库，保证所有查询命中同一份数据
pub async fn setup_db() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("connect sqlite memory");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// 直接落库一个已激活账号，跳过验证码流程
pub async fn create_account(db: &DbPool, email: &str, role: Role) -> i64 {
    let now = Utc::now();
    let account = accounts::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        is_active: Set(true),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    account.insert(db).await.expect("insert account").id
}

pub fn event_request(title: &str, location: &str, capacity: Option<i32>) -> CreateEventRequest {
    let starts_at = Utc::now() + Duration::days(7);
    CreateEventRequest {
        title: title.to_string(),
        description: format!("{title} description"),
        language: "en".to_string(),
        location: location.to_string(),
        starts_at,
        ends_at: starts_at + Duration::hours(2),
        capacity,
    }
}
