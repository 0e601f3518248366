use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum EmailOtps {
    Table,
    Id,
    AccountId,
    Code,
    Attempts,
    IsVerified,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailOtps::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailOtps::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailOtps::Code).string_len(6).not_null())
                    .col(
                        ColumnDef::new(EmailOtps::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(EmailOtps::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EmailOtps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailOtps::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_otps_account")
                            .from(EmailOtps::Table, EmailOtps::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个账号至多一条挑战记录，重发走 upsert
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_email_otps_account")
                    .table(EmailOtps::Table)
                    .col(EmailOtps::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailOtps::Table).to_owned())
            .await?;
        Ok(())
    }
}
