//! PostgreSQL todo repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::todo::{NewTodo, Todo, TodoId, TodoRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// PostgreSQL implementation of TodoRepository
#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Todo>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, description, completed, deadline, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list todos: {}", e)))?;

        rows.iter().map(row_to_todo).collect()
    }

    async fn find_by_id_and_user(
        &self,
        id: TodoId,
        user_id: UserId,
    ) -> Result<Option<Todo>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, description, completed, deadline, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.value())
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get todo: {}", e)))?;

        row.as_ref().map(row_to_todo).transpose()
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO todos (user_id, title, description, completed, deadline,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(todo.user_id.value())
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.deadline)
        .bind(todo.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create todo: {}", e)))?;

        Ok(Todo::with_id(TodoId::new(id), todo))
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = $3, description = $4, completed = $5, deadline = $6, updated_at = $7
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(todo.id().value())
        .bind(todo.user_id().value())
        .bind(todo.title())
        .bind(todo.description())
        .bind(todo.is_completed())
        .bind(todo.deadline())
        .bind(todo.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update todo: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Todo {} not found",
                todo.id()
            )));
        }

        Ok(todo.clone())
    }

    async fn delete_by_id_and_user(
        &self,
        id: TodoId,
        user_id: UserId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id.value())
            .bind(user_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete todo: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, user_id: UserId, keyword: &str) -> Result<Vec<Todo>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, description, completed, deadline, created_at, updated_at
            FROM todos
            WHERE user_id = $1
              AND (title ILIKE $2 ESCAPE '\' OR description ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.value())
        .bind(like_pattern(keyword))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to search todos: {}", e)))?;

        rows.iter().map(row_to_todo).collect()
    }
}

fn row_to_todo(row: &PgRow) -> Result<Todo, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid todo row: {}", e));

    let id: i64 = row.try_get("id").map_err(column)?;
    let user_id: i64 = row.try_get("user_id").map_err(column)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(column)?;

    let new = NewTodo {
        user_id: UserId::new(user_id),
        title: row.try_get("title").map_err(column)?,
        description: row.try_get("description").map_err(column)?,
        completed: row.try_get("completed").map_err(column)?,
        deadline: row.try_get("deadline").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
    };

    Ok(Todo::restore(TodoId::new(id), new, updated_at))
}

/// `%keyword%` with LIKE wildcards in the keyword taken literally
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');

    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}
