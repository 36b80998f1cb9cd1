//! Todo infrastructure module

mod postgres_repository;
mod service;

pub use postgres_repository::PostgresTodoRepository;
pub use service::{TodoInput, TodoService};
