use crate::entities::account_entity as accounts;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::OtpService;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    otp_service: OtpService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, otp_service: OtpService) -> Self {
        Self {
            pool,
            jwt_service,
            otp_service,
        }
    }

    /// 注册账号并签发首个验证码；验证码邮件在事务提交后异步发出
    pub async fn signup(&self, request: SignupRequest) -> AppResult<AccountResponse> {
        // 验证输入参数
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let email = request.email.trim().to_lowercase();

        // 预检重复邮箱，并发下由唯一索引兜底
        let existing = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        // 账号与验证码挑战同事务落库
        let txn = self.pool.begin().await?;

        let account = accounts::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            is_active: Set(false),
            role: Set(request.role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let account = match account.insert(&txn).await {
            Ok(model) => model,
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(AppError::DuplicateEmail);
                }
                return Err(err.into());
            }
        };

        let code = self
            .otp_service
            .issue_for_account(&txn, account.id)
            .await?;

        txn.commit().await?;

        // 提交成功后才发信，发送失败只记日志
        self.otp_service.dispatch_email(&account.email, &code);

        Ok(AccountResponse::from(account))
    }

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> AppResult<AccountResponse> {
        let email = request.email.trim().to_lowercase();
        let account = self
            .otp_service
            .verify(&email, &request.otp, Utc::now())
            .await?;
        Ok(AccountResponse::from(account))
    }

    pub async fn resend_otp(&self, request: ResendOtpRequest) -> AppResult<()> {
        let email = request.email.trim().to_lowercase();
        self.otp_service.resend(&email).await
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();

        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        // 先验密码再查激活状态，避免用该接口探测账号是否存在
        let is_valid = verify_password(&request.password, &account.password_hash)?;
        if !is_valid {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        if !account.is_active {
            return Err(AppError::EmailNotVerified);
        }

        self.issue_tokens(account)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let account_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        // 重新加载账号，签发时再次确认激活状态
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;

        if !account.is_active {
            return Err(AppError::EmailNotVerified);
        }

        self.issue_tokens(account)
    }

    fn issue_tokens(&self, account: accounts::Model) -> AppResult<AuthResponse> {
        let role = account.role.to_string();
        let access_token = self.jwt_service.generate_access_token(account.id, &role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(account.id, &role)?;

        Ok(AuthResponse {
            account: AccountResponse::from(account),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}
