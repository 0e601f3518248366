//! Background scheduled tasks for the application.
//!
//! Call `spawn_all` once during startup to launch them.

use crate::services::OtpService;

/// Spawn all background tasks.
///
/// Notes
/// - Tasks are detached via `tokio::spawn`; this function does not block.
pub fn spawn_all(otp_service: OtpService) {
    // 过期验证码清理（每小时）
    {
        let svc = otp_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.purge_stale().await {
                    Ok(n) if n > 0 => log::info!("Stale verification challenges purged: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to purge stale verification challenges: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        });
    }
}
