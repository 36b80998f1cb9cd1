//! User infrastructure module
//!
//! Password hashing with Argon2, the PostgreSQL user store and the
//! authentication flow service.

mod password;
mod postgres_repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserRepository;
pub(crate) use postgres_repository::{row_to_user, USER_COLUMNS};
pub use service::{normalize_email, AuthService, AuthServiceDeps, LoginRequest, RegisterRequest};
