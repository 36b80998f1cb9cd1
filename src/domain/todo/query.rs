//! Deadline-oriented views over one user's todos

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::entity::{due_soon_window, Todo};

/// Newest first
pub fn newest_first(mut todos: Vec<Todo>) -> Vec<Todo> {
    todos.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    todos
}

/// Earliest deadline first; todos without a deadline go last, newest first
pub fn sorted_by_deadline(mut todos: Vec<Todo>) -> Vec<Todo> {
    todos.sort_by(|a, b| match (a.deadline(), b.deadline()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at().cmp(&a.created_at()),
    });
    todos
}

pub fn with_deadlines(todos: Vec<Todo>) -> Vec<Todo> {
    by_deadline(todos.into_iter().filter(Todo::has_deadline).collect())
}

pub fn without_deadlines(todos: Vec<Todo>) -> Vec<Todo> {
    newest_first(todos.into_iter().filter(|t| !t.has_deadline()).collect())
}

/// Open todos whose deadline has passed
pub fn overdue(todos: Vec<Todo>, now: DateTime<Utc>) -> Vec<Todo> {
    by_deadline(
        todos
            .into_iter()
            .filter(|t| !t.is_completed() && t.deadline().is_some_and(|d| d < now))
            .collect(),
    )
}

/// Open todos due between now and the end of the due-soon window, bounds included
pub fn due_soon(todos: Vec<Todo>, now: DateTime<Utc>) -> Vec<Todo> {
    let until = now + due_soon_window();

    by_deadline(
        todos
            .into_iter()
            .filter(|t| !t.is_completed() && t.deadline().is_some_and(|d| d >= now && d <= until))
            .collect(),
    )
}

/// Todos with a deadline inside `[start, end]`
pub fn in_range(todos: Vec<Todo>, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Todo> {
    by_deadline(
        todos
            .into_iter()
            .filter(|t| t.deadline().is_some_and(|d| d >= start && d <= end))
            .collect(),
    )
}

pub fn search(todos: Vec<Todo>, keyword: &str) -> Vec<Todo> {
    newest_first(
        todos
            .into_iter()
            .filter(|t| t.matches_keyword(keyword))
            .collect(),
    )
}

fn by_deadline(mut todos: Vec<Todo>) -> Vec<Todo> {
    todos.sort_by_key(|t| t.deadline());
    todos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{NewTodo, TodoId};
    use crate::domain::user::UserId;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn todo(id: i64, deadline: Option<DateTime<Utc>>, completed: bool) -> Todo {
        Todo::with_id(
            TodoId::new(id),
            NewTodo {
                user_id: UserId::new(1),
                title: format!("todo {}", id),
                description: None,
                completed,
                deadline,
                created_at: now() - Duration::hours(100 - id),
            },
        )
    }

    fn ids(todos: &[Todo]) -> Vec<i64> {
        todos.iter().map(|t| t.id().value()).collect()
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo(1, None, false),
            todo(2, Some(now() + Duration::days(3)), false),
            todo(3, Some(now() - Duration::hours(2)), false),
            todo(4, Some(now() + Duration::hours(5)), false),
            todo(5, Some(now() - Duration::hours(1)), true),
            todo(6, None, true),
        ]
    }

    #[test]
    fn test_newest_first() {
        assert_eq!(ids(&newest_first(sample())), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_sorted_by_deadline_nulls_last() {
        assert_eq!(ids(&sorted_by_deadline(sample())), vec![3, 5, 4, 2, 6, 1]);
    }

    #[test]
    fn test_with_and_without_deadlines() {
        assert_eq!(ids(&with_deadlines(sample())), vec![3, 5, 4, 2]);
        assert_eq!(ids(&without_deadlines(sample())), vec![6, 1]);
    }

    #[test]
    fn test_overdue_excludes_completed() {
        assert_eq!(ids(&overdue(sample(), now())), vec![3]);
    }

    #[test]
    fn test_due_soon() {
        assert_eq!(ids(&due_soon(sample(), now())), vec![4]);
    }

    #[test]
    fn test_due_soon_bounds_are_inclusive() {
        let todos = vec![
            todo(1, Some(now()), false),
            todo(2, Some(now() + Duration::hours(24)), false),
        ];
        assert_eq!(ids(&due_soon(todos, now())), vec![1, 2]);
    }

    #[test]
    fn test_in_range() {
        let start = now() - Duration::hours(2);
        let end = now() + Duration::hours(5);

        assert_eq!(ids(&in_range(sample(), start, end)), vec![3, 5, 4]);
    }

    #[test]
    fn test_search() {
        let todos = vec![todo(1, None, false), todo(12, None, false), todo(3, None, false)];
        assert_eq!(ids(&search(todos, "TODO 1")), vec![12, 1]);
    }
}
