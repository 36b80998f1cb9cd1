//! Deadline statistics for one user's todos

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::entity::{due_soon_window, Todo};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStats {
    pub total_todos: u64,
    pub todos_with_deadlines: u64,
    pub todos_without_deadlines: u64,
    pub overdue_todos: u64,
    pub due_soon_todos: u64,
    pub completed_with_deadlines: u64,
    /// Percentage of todos with a deadline that are completed, 0 when none have one
    pub deadline_completion_rate: f64,
    pub next_deadline: Option<DateTime<Utc>>,
    /// Open todos due within the next 7 days
    pub todos_this_week: u64,
    /// Open todos due within the next 30 days
    pub todos_this_month: u64,
}

impl TodoStats {
    pub fn compute(todos: &[Todo], now: DateTime<Utc>) -> Self {
        let due_soon_until = now + due_soon_window();
        let week_end = now + Duration::days(7);
        let month_end = now + Duration::days(30);

        let mut stats = Self {
            total_todos: todos.len() as u64,
            todos_with_deadlines: 0,
            todos_without_deadlines: 0,
            overdue_todos: 0,
            due_soon_todos: 0,
            completed_with_deadlines: 0,
            deadline_completion_rate: 0.0,
            next_deadline: None,
            todos_this_week: 0,
            todos_this_month: 0,
        };

        for todo in todos {
            let Some(deadline) = todo.deadline() else {
                stats.todos_without_deadlines += 1;
                continue;
            };

            stats.todos_with_deadlines += 1;

            if todo.is_completed() {
                stats.completed_with_deadlines += 1;
                continue;
            }

            if deadline < now {
                stats.overdue_todos += 1;
                continue;
            }

            if deadline <= due_soon_until {
                stats.due_soon_todos += 1;
            }
            if deadline <= week_end {
                stats.todos_this_week += 1;
            }
            if deadline <= month_end {
                stats.todos_this_month += 1;
            }

            stats.next_deadline = Some(match stats.next_deadline {
                Some(current) if current <= deadline => current,
                _ => deadline,
            });
        }

        if stats.todos_with_deadlines > 0 {
            stats.deadline_completion_rate =
                stats.completed_with_deadlines as f64 / stats.todos_with_deadlines as f64 * 100.0;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{NewTodo, TodoId};
    use crate::domain::user::UserId;
    use chrono::TimeZone;

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
                created_at: now() - Duration::days(1),
            },
        )
    }

    #[test]
    fn test_empty() {
        let stats = TodoStats::compute(&[], now());

        assert_eq!(stats.total_todos, 0);
        assert_eq!(stats.deadline_completion_rate, 0.0);
        assert_eq!(stats.next_deadline, None);
    }

    #[test]
    fn test_no_deadlines_rate_is_zero() {
        let todos = vec![todo(1, None, true), todo(2, None, false)];
        let stats = TodoStats::compute(&todos, now());

        assert_eq!(stats.total_todos, 2);
        assert_eq!(stats.todos_without_deadlines, 2);
        assert_eq!(stats.deadline_completion_rate, 0.0);
    }

    #[test]
    fn test_mixed() {
        let todos = vec![
            todo(1, None, false),
            todo(2, Some(now() - Duration::hours(3)), false),
            todo(3, Some(now() + Duration::hours(6)), false),
            todo(4, Some(now() + Duration::days(5)), false),
            todo(5, Some(now() + Duration::days(20)), false),
            todo(6, Some(now() + Duration::days(1)), true),
        ];
        let stats = TodoStats::compute(&todos, now());

        assert_eq!(stats.total_todos, 6);
        assert_eq!(stats.todos_with_deadlines, 5);
        assert_eq!(stats.todos_without_deadlines, 1);
        assert_eq!(stats.overdue_todos, 1);
        assert_eq!(stats.due_soon_todos, 1);
        assert_eq!(stats.completed_with_deadlines, 1);
        assert_eq!(stats.deadline_completion_rate, 20.0);
        assert_eq!(stats.next_deadline, Some(now() + Duration::hours(6)));
        assert_eq!(stats.todos_this_week, 2);
        assert_eq!(stats.todos_this_month, 3);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(TodoStats::compute(&[], now())).unwrap();

        assert!(json.get("totalTodos").is_some());
        assert!(json.get("deadlineCompletionRate").is_some());
    }
}
