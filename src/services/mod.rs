pub mod auth_service;
pub mod enrollment_service;
pub mod event_service;
pub mod otp_service;

pub use auth_service::*;
pub use enrollment_service::*;
pub use event_service::*;
pub use otp_service::*;
