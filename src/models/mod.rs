pub mod auth;
pub mod common;
pub mod enrollment;
pub mod event;

pub use auth::*;
pub use common::*;
pub use enrollment::*;
pub use event::*;
