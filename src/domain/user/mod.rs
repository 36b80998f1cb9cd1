//! User domain
//!
//! This module provides domain types and traits for user accounts,
//! including user entities, validation, and repository traits.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserId, ROLE_ADMIN, ROLE_USER};
pub use repository::UserRepository;
pub use validation::{
    validate_email, validate_name, validate_password, validate_username, UserValidationError,
};
