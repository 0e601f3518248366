pub use sea_orm_migration::prelude::*;

mod m20250905_000001_create_accounts;
mod m20250905_000002_create_email_otps;
mod m20250905_000003_create_events;
mod m20250905_000004_create_enrollments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250905_000001_create_accounts::Migration),
            Box::new(m20250905_000002_create_email_otps::Migration),
            Box::new(m20250905_000003_create_events::Migration),
            Box::new(m20250905_000004_create_enrollments::Migration),
        ]
    }
}
