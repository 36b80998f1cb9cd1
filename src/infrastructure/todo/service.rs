//! Todo service: CRUD and deadline views scoped to the caller

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::todo::{
    query, validate_description, validate_title, NewTodo, Todo, TodoFilter, TodoId,
    TodoRepository, TodoStats, TodoValidationError,
};
use crate::domain::user::UserId;
use crate::domain::{Clock, DomainError, RequestContext};

/// Fields accepted by create and update
#[derive(Debug, Clone, Default)]
pub struct TodoInput {
    pub title: String,
    pub description: Option<String>,
    /// Left unchanged on update when `None`; false on create
    pub completed: Option<bool>,
    pub deadline: Option<DateTime<Utc>>,
}

impl TodoInput {
    fn validate(&self) -> Result<(), DomainError> {
        validate_title(&self.title).map_err(validation)?;
        validate_description(self.description.as_deref()).map_err(validation)?;
        Ok(())
    }
}

fn validation(e: TodoValidationError) -> DomainError {
    DomainError::validation(e.to_string())
}

/// Todo operations on behalf of the authenticated principal
#[derive(Debug)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Reference instant for deadline classification
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn owner(ctx: &RequestContext) -> Result<UserId, DomainError> {
        Ok(ctx.require_principal()?.user_id())
    }

    async fn all(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        let user_id = Self::owner(ctx)?;
        self.repository.find_by_user(user_id).await
    }

    async fn owned(&self, ctx: &RequestContext, id: TodoId) -> Result<Todo, DomainError> {
        let user_id = Self::owner(ctx)?;

        self.repository
            .find_by_id_and_user(id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Todo {} not found", id)))
    }

    /// Newest first
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        self.all(ctx).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: TodoId) -> Result<Todo, DomainError> {
        self.owned(ctx, id).await
    }

    pub async fn create(&self, ctx: &RequestContext, input: TodoInput) -> Result<Todo, DomainError> {
        let user_id = Self::owner(ctx)?;
        input.validate()?;

        let todo = self
            .repository
            .create(NewTodo {
                user_id,
                title: input.title.trim().to_string(),
                description: input.description,
                completed: input.completed.unwrap_or(false),
                deadline: input.deadline,
                created_at: self.clock.now(),
            })
            .await?;

        debug!(todo_id = %todo.id(), user_id = %user_id, "Todo created");
        Ok(todo)
    }

    /// Replace title, description and deadline; keep `completed` unless given
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: TodoId,
        input: TodoInput,
    ) -> Result<Todo, DomainError> {
        input.validate()?;
        let mut todo = self.owned(ctx, id).await?;
        let now = self.clock.now();

        todo.set_title(input.title.trim(), now);
        todo.set_description(input.description, now);
        todo.set_deadline(input.deadline, now);
        if let Some(completed) = input.completed {
            todo.set_completed(completed, now);
        }

        self.repository.update(&todo).await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: TodoId) -> Result<(), DomainError> {
        let user_id = Self::owner(ctx)?;

        if !self.repository.delete_by_id_and_user(id, user_id).await? {
            return Err(DomainError::not_found(format!("Todo {} not found", id)));
        }

        debug!(todo_id = %id, user_id = %user_id, "Todo deleted");
        Ok(())
    }

    pub async fn toggle(&self, ctx: &RequestContext, id: TodoId) -> Result<Todo, DomainError> {
        let mut todo = self.owned(ctx, id).await?;
        todo.toggle(self.clock.now());
        self.repository.update(&todo).await
    }

    pub async fn set_deadline(
        &self,
        ctx: &RequestContext,
        id: TodoId,
        deadline: DateTime<Utc>,
    ) -> Result<Todo, DomainError> {
        let mut todo = self.owned(ctx, id).await?;
        todo.set_deadline(Some(deadline), self.clock.now());
        self.repository.update(&todo).await
    }

    pub async fn remove_deadline(
        &self,
        ctx: &RequestContext,
        id: TodoId,
    ) -> Result<Todo, DomainError> {
        let mut todo = self.owned(ctx, id).await?;
        todo.set_deadline(None, self.clock.now());
        self.repository.update(&todo).await
    }

    pub async fn sorted_by_deadline(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        Ok(query::sorted_by_deadline(self.all(ctx).await?))
    }

    pub async fn with_deadlines(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        Ok(query::with_deadlines(self.all(ctx).await?))
    }

    pub async fn without_deadlines(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        Ok(query::without_deadlines(self.all(ctx).await?))
    }

    pub async fn overdue(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        let todos = self.all(ctx).await?;
        Ok(query::overdue(todos, self.clock.now()))
    }

    pub async fn due_soon(&self, ctx: &RequestContext) -> Result<Vec<Todo>, DomainError> {
        let todos = self.all(ctx).await?;
        Ok(query::due_soon(todos, self.clock.now()))
    }

    pub async fn by_date_range(
        &self,
        ctx: &RequestContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, DomainError> {
        let todos = self.all(ctx).await?;

        if start > end {
            return Err(validation(TodoValidationError::InvertedRange));
        }

        Ok(query::in_range(todos, start, end))
    }

    pub async fn stats(&self, ctx: &RequestContext) -> Result<TodoStats, DomainError> {
        let todos = self.all(ctx).await?;
        Ok(TodoStats::compute(&todos, self.clock.now()))
    }

    pub async fn search(&self, ctx: &RequestContext, keyword: &str) -> Result<Vec<Todo>, DomainError> {
        let user_id = Self::owner(ctx)?;
        let keyword = keyword.trim();

        if keyword.is_empty() {
            return Err(validation(TodoValidationError::EmptyKeyword));
        }

        self.repository.search(user_id, keyword).await
    }

    pub async fn filter(
        &self,
        ctx: &RequestContext,
        filter: &TodoFilter,
    ) -> Result<Vec<Todo>, DomainError> {
        let todos = self.all(ctx).await?;
        Ok(filter.apply(todos, self.clock.now()))
    }
}
