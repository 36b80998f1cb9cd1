//! Email verification infrastructure
//!
//! Code generation, the verification flow service, the periodic sweeper for
//! expired records and the PostgreSQL record store.

mod code;
mod postgres_repository;
mod service;
mod sweeper;

pub use code::generate_code;
pub use postgres_repository::{PostgresAccountActivator, PostgresVerificationRepository};
pub use service::{VerificationService, VerificationServiceDeps};
pub use sweeper::VerificationSweeper;
