//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{NewUser, User, UserId};
use crate::domain::DomainError;

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by their username (for login)
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Get a user by their email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Persist a new user. Duplicate usernames or emails fail with `Conflict`.
    async fn save(&self, user: NewUser) -> Result<User, DomainError>;

    /// Delete a user by ID. Returns true if a user was removed.
    async fn delete(&self, id: UserId) -> Result<bool, DomainError>;

    /// Count all users
    async fn count(&self) -> Result<u64, DomainError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn exists_by_first_name_and_last_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, DomainError>;
}
