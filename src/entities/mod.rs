pub mod accounts;
pub mod email_otps;
pub mod enrollments;
pub mod events;

pub use accounts as account_entity;
pub use email_otps as email_otp_entity;
pub use enrollments as enrollment_entity;
pub use events as event_entity;

pub use accounts::Role;
pub use enrollments::EnrollmentStatus;
