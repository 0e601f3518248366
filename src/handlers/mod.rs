pub mod auth;
pub mod enrollment;
pub mod event;

pub use auth::auth_config;
pub use enrollment::enrollment_config;
pub use event::event_config;
