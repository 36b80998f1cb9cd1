//! Infrastructure layer - External service implementations

pub mod auth;
pub mod logging;
pub mod notification;
pub mod observability;
pub mod storage;
pub mod todo;
pub mod user;
pub mod verification;
