use crate::entities::{account_entity as accounts, email_otp_entity as otps};
use crate::error::{AppError, AppResult};
use crate::external::SendGridService;
use crate::utils::generate_six_digit_code;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

pub const OTP_TTL_MINUTES: i64 = 5;
pub const OTP_MAX_ATTEMPTS: i32 = 3;
const RESEND_COOLDOWN_SECONDS: i64 = 60;

#[derive(Clone)]
pub struct OtpService {
    pool: DatabaseConnection,
    sendgrid_service: SendGridService,
}

impl OtpService {
    pub fn new(pool: DatabaseConnection, sendgrid_service: SendGridService) -> Self {
        Self {
            pool,
            sendgrid_service,
        }
    }

    /// 为账号签发验证码；account_id 唯一，重发即覆盖旧挑战（attempts 清零）
    pub async fn issue_for_account<C: ConnectionTrait>(
        &self,
        conn: &C,
        account_id: i64,
    ) -> AppResult<String> {
        let code = generate_six_digit_code();
        let now = Utc::now();

        let challenge = otps::ActiveModel {
            account_id: Set(account_id),
            code: Set(code.clone()),
            attempts: Set(0),
            is_verified: Set(false),
            created_at: Set(now),
            expires_at: Set(now + Duration::minutes(OTP_TTL_MINUTES)),
            ..Default::default()
        };

        otps::Entity::insert(challenge)
            .on_conflict(
                OnConflict::column(otps::Column::AccountId)
                    .update_columns([
                        otps::Column::Code,
                        otps::Column::Attempts,
                        otps::Column::IsVerified,
                        otps::Column::CreatedAt,
                        otps::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(code)
    }

    /// 事务提交后调用，异步发信
    pub fn dispatch_email(&self, email: &str, code: &str) {
        self.sendgrid_service
            .send_otp_email_detached(email.to_string(), code.to_string());
    }

    /// 校验验证码并激活账号。检查顺序：过期 -> 次数 -> 匹配；过期与否由调用方时钟判定
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<accounts::Model> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let challenge = otps::Entity::find()
            .filter(otps::Column::AccountId.eq(account.id))
            .filter(otps::Column::IsVerified.eq(false))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No pending verification for this account".to_string())
            })?;

        if challenge.expires_at < now {
            return Err(AppError::OtpExpired);
        }

        if challenge.attempts >= OTP_MAX_ATTEMPTS {
            return Err(AppError::OtpAttemptsExceeded);
        }

        if challenge.code != code {
            // 失败计数直接落库，进程重启或并发请求下都不丢
            otps::Entity::update_many()
                .col_expr(
                    otps::Column::Attempts,
                    Expr::col(otps::Column::Attempts).add(1),
                )
                .filter(otps::Column::Id.eq(challenge.id))
                .exec(&self.pool)
                .await?;
            return Err(AppError::OtpMismatch);
        }

        // 挑战核销与账号激活同事务
        let txn = self.pool.begin().await?;

        let mut challenge_am = challenge.into_active_model();
        challenge_am.is_verified = Set(true);
        challenge_am.update(&txn).await?;

        let mut account_am = account.into_active_model();
        account_am.is_active = Set(true);
        account_am.updated_at = Set(Utc::now());
        let account = account_am.update(&txn).await?;

        txn.commit().await?;

        Ok(account)
    }

    /// 重发验证码，60 秒冷却
    pub async fn resend(&self, email: &str) -> AppResult<()> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        if account.is_active {
            return Err(AppError::ValidationError(
                "Email already verified".to_string(),
            ));
        }

        // 冷却基于上一条挑战的签发时间
        let existing = otps::Entity::find()
            .filter(otps::Column::AccountId.eq(account.id))
            .one(&self.pool)
            .await?;

        if let Some(challenge) = existing
            && Utc::now().signed_duration_since(challenge.created_at)
                < Duration::seconds(RESEND_COOLDOWN_SECONDS)
        {
            return Err(AppError::ValidationError(
                "Verification code requested too frequently, try again later".to_string(),
            ));
        }

        let code = self.issue_for_account(&self.pool, account.id).await?;
        self.dispatch_email(&account.email, &code);

        Ok(())
    }

    /// 清理过期超过 24 小时仍未核销的挑战；返回删除行数
    pub async fn purge_stale(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::hours(24);
        let result = otps::Entity::delete_many()
            .filter(otps::Column::IsVerified.eq(false))
            .filter(otps::Column::ExpiresAt.lt(cutoff))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }
}
