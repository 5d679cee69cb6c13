//! Database models split into domain-specific modules.

pub mod user;
pub mod workout;

pub use user::*;
pub use workout::*;
