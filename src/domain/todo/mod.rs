//! Todo domain
//!
//! Entities, deadline classification, and the pure query, filter and
//! statistics functions that run over a single user's todos.

mod entity;
mod filter;
pub mod query;
mod repository;
mod stats;
mod validation;

pub use entity::{
    due_soon_window, DeadlineStatus, NewTodo, Todo, TodoId, DUE_SOON_WINDOW_HOURS,
};
pub use filter::{SortBy, SortDirection, TodoFilter};
pub use repository::TodoRepository;
pub use stats::TodoStats;
pub use validation::{
    validate_description, validate_title, TodoValidationError, MAX_DESCRIPTION_LENGTH,
    MAX_TITLE_LENGTH,
};
