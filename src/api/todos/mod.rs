//! Todo endpoints, all scoped to the authenticated caller

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::Context;
use crate::api::state::AppState;
use crate::api::types::datetime::{deserialize_optional, parse_datetime};
use crate::api::types::{ApiError, Json, ValidatedJson};
use crate::domain::todo::{
    DeadlineStatus, SortBy, SortDirection, Todo, TodoFilter, TodoId, TodoStats,
};
use crate::infrastructure::todo::TodoInput;

pub fn create_todos_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/sorted-by-deadline", get(sorted_by_deadline))
        .route("/with-deadlines", get(with_deadlines))
        .route("/without-deadlines", get(without_deadlines))
        .route("/overdue", get(overdue))
        .route("/due-soon", get(due_soon))
        .route("/by-date-range", get(by_date_range))
        .route("/stats", get(stats))
        .route("/search", get(search))
        .route("/filter", post(filter_todos))
        .route(
            "/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/{id}/toggle", patch(toggle_todo))
        .route(
            "/{id}/deadline",
            patch(set_deadline).delete(remove_deadline),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TodoBody {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub deadline: Option<DateTime<Utc>>,
}

impl From<TodoBody> for TodoInput {
    fn from(body: TodoBody) -> Self {
        Self {
            title: body.title,
            description: body.description,
            completed: body.completed,
            deadline: body.deadline,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBody {
    pub completed: Option<bool>,
    pub has_deadline: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub deadline_from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub deadline_to: Option<DateTime<Utc>>,
    pub overdue_only: Option<bool>,
    pub due_soon_only: Option<bool>,
    pub sort_by: Option<SortBy>,
    pub sort_direction: Option<SortDirection>,
}

impl From<FilterBody> for TodoFilter {
    fn from(body: FilterBody) -> Self {
        Self {
            completed: body.completed,
            has_deadline: body.has_deadline,
            deadline_from: body.deadline_from,
            deadline_to: body.deadline_to,
            overdue_only: body.overdue_only.unwrap_or(false),
            due_soon_only: body.due_soon_only.unwrap_or(false),
            sort_by: body.sort_by.unwrap_or_default(),
            sort_direction: body.sort_direction.unwrap_or_default(),
        }
    }
}

// Query values arrive as strings so malformed input gets a JSON error body

#[derive(Debug, Deserialize)]
pub struct DeadlineQuery {
    pub deadline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// A todo as returned to its owner, with its deadline classification
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub has_deadline: bool,
    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub deadline_status: DeadlineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoResponse {
    pub fn new(todo: &Todo, now: DateTime<Utc>) -> Self {
        Self {
            id: todo.id().value(),
            title: todo.title().to_string(),
            description: todo.description().map(str::to_string),
            completed: todo.is_completed(),
            deadline: todo.deadline(),
            has_deadline: todo.has_deadline(),
            is_overdue: todo.is_overdue(now),
            is_due_soon: todo.is_due_soon(now),
            deadline_status: todo.deadline_status(now),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
        }
    }
}

fn respond_one(state: &AppState, todo: Todo) -> Json<TodoResponse> {
    Json(TodoResponse::new(&todo, state.todos.now()))
}

fn respond_many(state: &AppState, todos: Vec<Todo>) -> Json<Vec<TodoResponse>> {
    let now = state.todos.now();
    Json(todos.iter().map(|todo| TodoResponse::new(todo, now)).collect())
}

fn parse_id(raw: &str) -> Result<TodoId, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(TodoId::new)
        .ok_or_else(|| {
            ApiError::bad_request(format!("Invalid todo id '{}'", raw)).with_code("invalid_id")
        })
}

fn required_datetime(name: &str, value: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("Query parameter '{}' is required", name)))?;

    parse_datetime(value).ok_or_else(|| {
        ApiError::validation(format!(
            "Query parameter '{}' must be an ISO-8601 date-time",
            name
        ))
    })
}

/// GET /api/todos
pub async fn list_todos(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.list(&ctx).await?;
    Ok(respond_many(&state, todos))
}

/// GET /api/todos/{id}
pub async fn get_todo(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.todos.get(&ctx, parse_id(&id)?).await?;
    Ok(respond_one(&state, todo))
}

/// POST /api/todos
pub async fn create_todo(
    State(state): State<AppState>,
    Context(ctx): Context,
    ValidatedJson(body): ValidatedJson<TodoBody>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    let todo = state.todos.create(&ctx, body.into()).await?;
    Ok((StatusCode::CREATED, respond_one(&state, todo)))
}

/// PUT /api/todos/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<TodoBody>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .update(&ctx, parse_id(&id)?, body.into())
        .await?;
    Ok(respond_one(&state, todo))
}

/// DELETE /api/todos/{id}
pub async fn delete_todo(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.todos.delete(&ctx, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/todos/{id}/toggle
pub async fn toggle_todo(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.todos.toggle(&ctx, parse_id(&id)?).await?;
    Ok(respond_one(&state, todo))
}

/// PATCH /api/todos/{id}/deadline?deadline=
pub async fn set_deadline(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
    Query(query): Query<DeadlineQuery>,
) -> Result<Json<TodoResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deadline = required_datetime("deadline", query.deadline.as_deref())?;

    let todo = state.todos.set_deadline(&ctx, id, deadline).await?;
    Ok(respond_one(&state, todo))
}

/// DELETE /api/todos/{id}/deadline
pub async fn remove_deadline(
    State(state): State<AppState>,
    Context(ctx): Context,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.todos.remove_deadline(&ctx, parse_id(&id)?).await?;
    Ok(respond_one(&state, todo))
}

pub async fn sorted_by_deadline(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.sorted_by_deadline(&ctx).await?;
    Ok(respond_many(&state, todos))
}

pub async fn with_deadlines(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.with_deadlines(&ctx).await?;
    Ok(respond_many(&state, todos))
}

pub async fn without_deadlines(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.without_deadlines(&ctx).await?;
    Ok(respond_many(&state, todos))
}

pub async fn overdue(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.overdue(&ctx).await?;
    Ok(respond_many(&state, todos))
}

pub async fn due_soon(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.due_soon(&ctx).await?;
    Ok(respond_many(&state, todos))
}

/// GET /api/todos/by-date-range?startDate=&endDate=
pub async fn by_date_range(
    State(state): State<AppState>,
    Context(ctx): Context,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let start = required_datetime("startDate", query.start_date.as_deref())?;
    let end = required_datetime("endDate", query.end_date.as_deref())?;

    let todos = state.todos.by_date_range(&ctx, start, end).await?;
    Ok(respond_many(&state, todos))
}

/// GET /api/todos/stats
pub async fn stats(
    State(state): State<AppState>,
    Context(ctx): Context,
) -> Result<Json<TodoStats>, ApiError> {
    Ok(Json(state.todos.stats(&ctx).await?))
}

/// GET /api/todos/search?keyword=
pub async fn search(
    State(state): State<AppState>,
    Context(ctx): Context,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let keyword = query.keyword.unwrap_or_default();
    let todos = state.todos.search(&ctx, &keyword).await?;
    Ok(respond_many(&state, todos))
}

/// POST /api/todos/filter
pub async fn filter_todos(
    State(state): State<AppState>,
    Context(ctx): Context,
    Json(body): Json<FilterBody>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.filter(&ctx, &body.into()).await?;
    Ok(respond_many(&state, todos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), TodoId::new(42));
        assert_eq!(parse_id("abc").unwrap_err().code(), "invalid_id");
        assert_eq!(parse_id("0").unwrap_err().code(), "invalid_id");
    }

    #[test]
    fn test_required_datetime() {
        assert!(required_datetime("deadline", Some("2024-06-01T12:00:00")).is_ok());
        assert_eq!(
            required_datetime("deadline", None).unwrap_err().code(),
            "validation_error"
        );
        assert_eq!(
            required_datetime("deadline", Some("later")).unwrap_err().code(),
            "validation_error"
        );
    }

    #[test]
    fn test_filter_body_defaults() {
        let filter: TodoFilter = serde_json::from_str::<FilterBody>("{}").unwrap().into();
        assert_eq!(filter, TodoFilter::default());
    }

    #[test]
    fn test_filter_body_parses_sort_and_dates() {
        let body: FilterBody = serde_json::from_str(
            r#"{"completed":false,"deadlineFrom":"2024-06-01T00:00:00","sortBy":"DEADLINE","sortDirection":"ASC","overdueOnly":true}"#,
        )
        .unwrap();
        let filter: TodoFilter = body.into();

        assert_eq!(filter.completed, Some(false));
        assert!(filter.deadline_from.is_some());
        assert_eq!(filter.sort_by, SortBy::Deadline);
        assert_eq!(filter.sort_direction, SortDirection::Asc);
        assert!(filter.overdue_only);
    }
}
