//! Authentication infrastructure module
//!
//! This module provides JWT token management for user authentication.

mod jwt;

pub use jwt::{
    JwtClaims, JwtConfig, JwtService, TokenCodec, TokenError, TokenKind, TokenPair,
    MIN_SECRET_LENGTH,
};

use crate::domain::user::User;

/// Result of a login or a completed verification: the profile plus fresh tokens
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}
