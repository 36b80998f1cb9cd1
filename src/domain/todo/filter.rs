//! Ad-hoc filtering and sorting of todos

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Todo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Deadline,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Every criterion is optional; an empty filter returns everything newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub has_deadline: Option<bool>,
    pub deadline_from: Option<DateTime<Utc>>,
    pub deadline_to: Option<DateTime<Utc>>,
    pub overdue_only: bool,
    pub due_soon_only: bool,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo, now: DateTime<Utc>) -> bool {
        if self.completed.is_some_and(|c| todo.is_completed() != c) {
            return false;
        }

        if self.has_deadline.is_some_and(|h| todo.has_deadline() != h) {
            return false;
        }

        if let Some(from) = self.deadline_from {
            if !todo.deadline().is_some_and(|d| d >= from) {
                return false;
            }
        }

        if let Some(to) = self.deadline_to {
            if !todo.deadline().is_some_and(|d| d <= to) {
                return false;
            }
        }

        if self.overdue_only && !todo.is_overdue(now) {
            return false;
        }

        if self.due_soon_only && !todo.is_due_soon(now) {
            return false;
        }

        true
    }

    pub fn apply(&self, todos: Vec<Todo>, now: DateTime<Utc>) -> Vec<Todo> {
        let mut result: Vec<Todo> = todos.into_iter().filter(|t| self.matches(t, now)).collect();
        result.sort_by(|a, b| self.compare(a, b));
        result
    }

    fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let ordering = match self.sort_by {
            SortBy::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortBy::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
            SortBy::Deadline => {
                // Missing deadlines stay last in both directions
                match (a.deadline(), b.deadline()) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };

        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
