use crate::config::SendGridConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde_json::json;

const SEND_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Clone)]
pub struct SendGridService {
    http: Client,
    cfg: SendGridConfig,
}

impl SendGridService {
    pub fn new(cfg: SendGridConfig) -> Self {
        let http = Client::builder()
            .user_agent("gatherly-backend/sendgrid")
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }

    pub fn is_enabled(&self) -> bool {
        !self.cfg.api_key.is_empty()
    }

    /// 通过 SendGrid v3 发送验证码邮件。未配置 api_key 时跳过（本地开发用）
    pub async fn send_otp_email(&self, to: &str, code: &str) -> AppResult<()> {
        if !self.is_enabled() {
            log::info!("SendGrid 未配置，跳过发送验证码邮件至 {}", to);
            return Ok(());
        }

        let mut from = json!({ "email": self.cfg.from_email });
        if let Some(name) = &self.cfg.from_name {
            from["name"] = json!(name);
        }

        let req_body = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": from,
            "subject": "Your verification code",
            "content": [{
                "type": "text/plain",
                "value": format!("Your verification code is {}. It expires in 5 minutes.", code),
            }],
        });

        let resp = self
            .http
            .post(SEND_ENDPOINT)
            .bearer_auth(&self.cfg.api_key)
            .json(&req_body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            log::info!("验证码邮件已发送至 {}", to);
            Ok(())
        } else {
            let error_text = resp.text().await.unwrap_or_default();
            Err(AppError::ExternalApiError(format!(
                "SendGrid API error: HTTP {}: {}",
                status.as_u16(),
                error_text
            )))
        }
    }

    /// 事务提交后异步发信，失败只记日志，不回滚业务结果
    pub fn send_otp_email_detached(&self, to: String, code: String) {
        let sender = self.clone();
        tokio::spawn(async move {
            if let Err(err) = sender.send_otp_email(&to, &code).await {
                log::error!("发送验证码邮件失败 ({}): {}", to, err);
            }
        });
    }
}
