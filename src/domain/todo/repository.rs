//! Todo repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{NewTodo, Todo, TodoId};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository for todos. Every lookup is scoped to the owning user.
#[async_trait]
pub trait TodoRepository: Send + Sync + Debug {
    /// All todos of a user, newest first
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Todo>, DomainError>;

    async fn find_by_id_and_user(
        &self,
        id: TodoId,
        user_id: UserId,
    ) -> Result<Option<Todo>, DomainError>;

    async fn create(&self, todo: NewTodo) -> Result<Todo, DomainError>;

    /// Persist changes to an existing todo; `NotFound` when it is gone
    async fn update(&self, todo: &Todo) -> Result<Todo, DomainError>;

    /// Returns false when no todo with that id belongs to the user
    async fn delete_by_id_and_user(&self, id: TodoId, user_id: UserId)
        -> Result<bool, DomainError>;

    /// Case-insensitive keyword match on title or description, newest first
    async fn search(&self, user_id: UserId, keyword: &str) -> Result<Vec<Todo>, DomainError>;
}
