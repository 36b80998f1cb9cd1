//! Todo entity and deadline classification

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;

/// Window ahead of `now` in which an open todo counts as due soon
pub const DUE_SOON_WINDOW_HOURS: i64 = 24;

pub fn due_soon_window() -> Duration {
    Duration::hours(DUE_SOON_WINDOW_HOURS)
}

/// Store-generated todo identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a todo stands relative to its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineStatus {
    NoDeadline,
    Overdue,
    DueSoon,
    OnTime,
}

impl DeadlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDeadline => "NO_DEADLINE",
            Self::Overdue => "OVERDUE",
            Self::DueSoon => "DUE_SOON",
            Self::OnTime => "ON_TIME",
        }
    }
}

/// A todo that has not been persisted yet
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Todo entity, always owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    id: TodoId,
    user_id: UserId,
    title: String,
    description: Option<String>,
    completed: bool,
    deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn with_id(id: TodoId, new: NewTodo) -> Self {
        Self {
            id,
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            deadline: new.deadline,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    /// Rebuild a todo loaded from storage
    pub fn restore(id: TodoId, new: NewTodo, updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            ..Self::with_id(id, new)
        }
    }

    // Getters

    pub fn id(&self) -> TodoId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Deadline views

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    /// Open and past its deadline
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => !self.completed && now > deadline,
            None => false,
        }
    }

    /// Open with a deadline strictly inside the next 24 hours
    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => !self.completed && deadline > now && deadline < now + due_soon_window(),
            None => false,
        }
    }

    pub fn deadline_status(&self, now: DateTime<Utc>) -> DeadlineStatus {
        if !self.has_deadline() {
            DeadlineStatus::NoDeadline
        } else if self.is_overdue(now) {
            DeadlineStatus::Overdue
        } else if self.is_due_soon(now) {
            DeadlineStatus::DueSoon
        } else {
            DeadlineStatus::OnTime
        }
    }

    /// Case-insensitive substring match on title or description
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();

        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    // Mutators

    pub fn set_title(&mut self, title: impl Into<String>, now: DateTime<Utc>) {
        self.title = title.into();
        self.touch(now);
    }

    pub fn set_description(&mut self, description: Option<String>, now: DateTime<Utc>) {
        self.description = description;
        self.touch(now);
    }

    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        self.completed = completed;
        self.touch(now);
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.touch(now);
    }

    pub fn set_deadline(&mut self, deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        self.deadline = deadline;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn todo(deadline: Option<DateTime<Utc>>, completed: bool) -> Todo {
        Todo::with_id(
            TodoId::new(1),
            NewTodo {
                user_id: UserId::new(1),
                title: "Write report".to_string(),
                description: Some("Quarterly numbers".to_string()),
                completed,
                deadline,
                created_at: now() - Duration::days(2),
            },
        )
    }

    #[test]
    fn test_no_deadline() {
        let todo = todo(None, false);

        assert!(!todo.has_deadline());
        assert!(!todo.is_overdue(now()));
        assert!(!todo.is_due_soon(now()));
        assert_eq!(todo.deadline_status(now()), DeadlineStatus::NoDeadline);
    }

    #[test]
    fn test_overdue() {
        let todo = todo(Some(now() - Duration::hours(1)), false);

        assert!(todo.is_overdue(now()));
        assert!(!todo.is_due_soon(now()));
        assert_eq!(todo.deadline_status(now()), DeadlineStatus::Overdue);
    }

    #[test]
    fn test_completed_is_never_overdue() {
        let todo = todo(Some(now() - Duration::hours(1)), true);

        assert!(!todo.is_overdue(now()));
        assert_eq!(todo.deadline_status(now()), DeadlineStatus::OnTime);
    }

    #[test]
    fn test_due_soon_window() {
        assert_eq!(
            todo(Some(now() + Duration::hours(23)), false).deadline_status(now()),
            DeadlineStatus::DueSoon
        );
        assert_eq!(
            todo(Some(now() + Duration::hours(24)), false).deadline_status(now()),
            DeadlineStatus::OnTime
        );
        assert_eq!(
            todo(Some(now() + Duration::days(3)), false).deadline_status(now()),
            DeadlineStatus::OnTime
        );
    }

    #[test]
    fn test_deadline_exactly_now_is_neither() {
        let todo = todo(Some(now()), false);

        assert!(!todo.is_overdue(now()));
        assert!(!todo.is_due_soon(now()));
    }

    #[test]
    fn test_matches_keyword() {
        let todo = todo(None, false);

        assert!(todo.matches_keyword("REPORT"));
        assert!(todo.matches_keyword("quarterly"));
        assert!(!todo.matches_keyword("groceries"));
    }

    #[test]
    fn test_toggle_touches_updated_at() {
        let mut todo = todo(None, false);
        let later = now() + Duration::minutes(5);

        todo.toggle(later);

        assert!(todo.is_completed());
        assert_eq!(todo.updated_at(), later);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DeadlineStatus::DueSoon).unwrap();
        assert_eq!(json, "\"DUE_SOON\"");
        assert_eq!(DeadlineStatus::NoDeadline.as_str(), "NO_DEADLINE");
    }
}
