//! In-memory storage implementation

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::todo::{query, NewTodo, Todo, TodoId, TodoRepository};
use crate::domain::user::{NewUser, User, UserId, UserRepository};
use crate::domain::verification::{
    AccountActivator, NewVerification, VerificationId, VerificationRecord, VerificationRepository,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    verifications: BTreeMap<VerificationId, VerificationRecord>,
    todos: BTreeMap<TodoId, Todo>,
    next_user_id: i64,
    next_verification_id: i64,
    next_todo_id: i64,
}

impl MemoryState {
    fn next_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        UserId::new(self.next_user_id)
    }

    fn next_verification_id(&mut self) -> VerificationId {
        self.next_verification_id += 1;
        VerificationId::new(self.next_verification_id)
    }

    fn next_todo_id(&mut self) -> TodoId {
        self.next_todo_id += 1;
        TodoId::new(self.next_todo_id)
    }
}

/// Thread-safe store backing every repository trait
///
/// Useful for testing and development. Data is lost when the process terminates.
/// Clones share the same state, so one store can be handed out as each repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn save(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.username() == user.username) {
            return Err(DomainError::conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }

        if state.users.values().any(|u| u.email() == user.email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let id = state.next_user_id();
        let user = User::with_id(id, user);
        state.users.insert(id, user.clone());

        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        Ok(self.write()?.users.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.read()?.users.len() as u64)
    }

    async fn exists_by_first_name_and_last_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool, DomainError> {
        Ok(self
            .read()?
            .users
            .values()
            .any(|u| u.first_name() == first_name && u.last_name() == last_name))
    }
}

#[async_trait]
impl VerificationRepository for InMemoryStore {
    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>, DomainError> {
        Ok(self
            .read()?
            .verifications
            .values()
            .filter(|r| r.email() == email && !r.is_expired(now))
            .max_by_key(|r| (r.created_at(), r.id()))
            .cloned())
    }

    async fn count_recent(&self, email: &str, since: DateTime<Utc>) -> Result<u64, DomainError> {
        Ok(self
            .read()?
            .verifications
            .values()
            .filter(|r| r.email() == email && r.created_at() >= since)
            .count() as u64)
    }

    async fn save(&self, record: NewVerification) -> Result<VerificationRecord, DomainError> {
        let mut state = self.write()?;
        let id = state.next_verification_id();
        let record = VerificationRecord::with_id(id, record);
        state.verifications.insert(id, record.clone());

        Ok(record)
    }

    async fn delete(&self, id: VerificationId) -> Result<bool, DomainError> {
        Ok(self.write()?.verifications.remove(&id).is_some())
    }

    async fn increment_attempts(&self, id: VerificationId) -> Result<Option<u32>, DomainError> {
        Ok(self
            .write()?
            .verifications
            .get_mut(&id)
            .map(VerificationRecord::increment_attempts))
    }

    async fn delete_verified(&self, email: &str) -> Result<u64, DomainError> {
        let mut state = self.write()?;
        let before = state.verifications.len();
        state
            .verifications
            .retain(|_, r| !(r.email() == email && r.is_verified()));

        Ok((before - state.verifications.len()) as u64)
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut state = self.write()?;
        let count = state.verifications.len();
        state.verifications.retain(|_, r| r.expires_at() >= before);

        Ok((count - state.verifications.len()) as u64)
    }
}

#[async_trait]
impl AccountActivator for InMemoryStore {
    async fn activate(
        &self,
        record_id: VerificationId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        // One write guard for the whole unit, nothing is written until every check passes
        let mut state = self.write()?;

        match state.verifications.get(&record_id) {
            None => return Err(DomainError::InvalidOrExpiredCode),
            Some(record) if record.is_expired(now) => {
                return Err(DomainError::InvalidOrExpiredCode);
            }
            Some(record) if record.is_verified() => return Err(DomainError::AlreadyVerified),
            Some(_) => {}
        }

        let user_id = state
            .users
            .values()
            .find(|u| u.email() == email)
            .map(User::id)
            .ok_or_else(|| DomainError::not_found(format!("No user with email '{}'", email)))?;

        state
            .verifications
            .retain(|id, r| *id == record_id || !(r.email() == email && r.is_verified()));

        if let Some(record) = state.verifications.get_mut(&record_id) {
            record.mark_verified();
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::not_found(format!("No user with email '{}'", email)))?;
        user.mark_verified(now);

        Ok(user.clone())
    }
}

#[async_trait]
impl TodoRepository for InMemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Todo>, DomainError> {
        let todos = self
            .read()?
            .todos
            .values()
            .filter(|t| t.user_id() == user_id)
            .cloned()
            .collect();

        Ok(query::newest_first(todos))
    }

    async fn find_by_id_and_user(
        &self,
        id: TodoId,
        user_id: UserId,
    ) -> Result<Option<Todo>, DomainError> {
        Ok(self
            .read()?
            .todos
            .get(&id)
            .filter(|t| t.user_id() == user_id)
            .cloned())
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, DomainError> {
        let mut state = self.write()?;
        let id = state.next_todo_id();
        let todo = Todo::with_id(id, todo);
        state.todos.insert(id, todo.clone());

        Ok(todo)
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, DomainError> {
        let mut state = self.write()?;

        match state.todos.get_mut(&todo.id()) {
            Some(existing) if existing.user_id() == todo.user_id() => {
                *existing = todo.clone();
                Ok(todo.clone())
            }
            _ => Err(DomainError::not_found(format!(
                "Todo {} not found",
                todo.id()
            ))),
        }
    }

    async fn delete_by_id_and_user(
        &self,
        id: TodoId,
        user_id: UserId,
    ) -> Result<bool, DomainError> {
        let mut state = self.write()?;

        if state.todos.get(&id).is_some_and(|t| t.user_id() == user_id) {
            state.todos.remove(&id);
            return Ok(true);
        }

        Ok(false)
    }

    async fn search(&self, user_id: UserId, keyword: &str) -> Result<Vec<Todo>, DomainError> {
        let todos = self.find_by_user(user_id).await?;
        Ok(query::search(todos, keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser::registration(username, email, "$argon2id$hash", "Alice", "Smith", now())
    }

    fn new_verification(email: &str, created_at: DateTime<Utc>) -> NewVerification {
        NewVerification {
            email: email.to_string(),
            code: "123456".to_string(),
            expires_at: created_at + Duration::minutes(10),
            created_at,
        }
    }

    fn new_todo(user_id: UserId, title: &str, created_at: DateTime<Utc>) -> NewTodo {
        NewTodo {
            user_id,
            title: title.to_string(),
            description: None,
            completed: false,
            deadline: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = InMemoryStore::new();

        let first = UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let second = UserRepository::save(&store, new_user("bob", "bob@example.com"))
            .await
            .unwrap();

        assert_eq!(first.id(), UserId::new(1));
        assert_eq!(second.id(), UserId::new(2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_conflict() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let by_name = UserRepository::save(&store, new_user("alice", "other@example.com")).await;
        let by_email = UserRepository::save(&store, new_user("alice2", "alice@example.com")).await;

        assert!(matches!(by_name, Err(DomainError::Conflict { .. })));
        assert!(matches!(by_email, Err(DomainError::Conflict { .. })));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_email("alice@example.com").await.unwrap().is_some());
        assert!(store.exists_by_username("alice").await.unwrap());
        assert!(!store.exists_by_email("nobody@example.com").await.unwrap());
        assert!(store
            .exists_by_first_name_and_last_name("Alice", "Smith")
            .await
            .unwrap());
        assert!(!store
            .exists_by_first_name_and_last_name("Alice", "Jones")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_find_active_returns_latest_unexpired() {
        let store = InMemoryStore::new();
        let older = VerificationRepository::save(&store, new_verification("a@x.io", now()))
            .await
            .unwrap();
        let newer = VerificationRepository::save(
            &store,
            new_verification("a@x.io", now() + Duration::minutes(2)),
        )
        .await
        .unwrap();

        let active = store.find_active("a@x.io", now() + Duration::minutes(3)).await.unwrap();
        assert_eq!(active.unwrap().id(), newer.id());

        // only the newer one is still alive
        let active = store
            .find_active("a@x.io", now() + Duration::minutes(11))
            .await
            .unwrap();
        assert_eq!(active.unwrap().id(), newer.id());
        assert_ne!(older.id(), newer.id());

        let active = store
            .find_active("a@x.io", now() + Duration::minutes(12))
            .await
            .unwrap();
        assert!(active.is_none());
    }

    #[tokio::test]
    async fn test_count_recent_is_inclusive() {
        let store = InMemoryStore::new();
        VerificationRepository::save(&store, new_verification("a@x.io", now()))
            .await
            .unwrap();

        assert_eq!(store.count_recent("a@x.io", now()).await.unwrap(), 1);
        assert_eq!(
            store
                .count_recent("a@x.io", now() + Duration::seconds(1))
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.count_recent("b@x.io", now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_attempts() {
        let store = InMemoryStore::new();
        let record = VerificationRepository::save(&store, new_verification("a@x.io", now()))
            .await
            .unwrap();

        assert_eq!(store.increment_attempts(record.id()).await.unwrap(), Some(1));
        assert_eq!(store.increment_attempts(record.id()).await.unwrap(), Some(2));
        assert_eq!(
            store
                .increment_attempts(VerificationId::new(99))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_delete_expired_removes_strictly_older() {
        let store = InMemoryStore::new();
        VerificationRepository::save(&store, new_verification("a@x.io", now()))
            .await
            .unwrap();
        VerificationRepository::save(
            &store,
            new_verification("b@x.io", now() + Duration::minutes(5)),
        )
        .await
        .unwrap();

        let expiry_of_first = now() + Duration::minutes(10);
        assert_eq!(store.delete_expired(expiry_of_first).await.unwrap(), 0);
        assert_eq!(
            store
                .delete_expired(expiry_of_first + Duration::seconds(1))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .delete_expired(expiry_of_first + Duration::seconds(1))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_activate_marks_user_and_record() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let record =
            VerificationRepository::save(&store, new_verification("alice@example.com", now()))
                .await
                .unwrap();

        let user = store
            .activate(record.id(), "alice@example.com", now() + Duration::minutes(1))
            .await
            .unwrap();

        assert!(user.is_active());
        let active = store
            .find_active("alice@example.com", now() + Duration::minutes(1))
            .await
            .unwrap()
            .unwrap();
        assert!(active.is_verified());
    }

    #[tokio::test]
    async fn test_activate_drops_previously_verified_records() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let first =
            VerificationRepository::save(&store, new_verification("alice@example.com", now()))
                .await
                .unwrap();
        store
            .activate(first.id(), "alice@example.com", now())
            .await
            .unwrap();

        let second = VerificationRepository::save(
            &store,
            new_verification("alice@example.com", now() + Duration::minutes(1)),
        )
        .await
        .unwrap();
        store
            .activate(second.id(), "alice@example.com", now() + Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(store.delete_verified("alice@example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_activate_rejects_expired_record_without_writing() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let record =
            VerificationRepository::save(&store, new_verification("alice@example.com", now()))
                .await
                .unwrap();

        let result = store
            .activate(record.id(), "alice@example.com", now() + Duration::minutes(10))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidOrExpiredCode)));
        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert!(!user.is_email_verified());
    }

    #[tokio::test]
    async fn test_second_activation_of_same_record_is_already_verified() {
        let store = InMemoryStore::new();
        UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let record =
            VerificationRepository::save(&store, new_verification("alice@example.com", now()))
                .await
                .unwrap();

        let first = store.activate(record.id(), "alice@example.com", now()).await;
        let second = store.activate(record.id(), "alice@example.com", now()).await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(DomainError::AlreadyVerified)));
        let active = store
            .find_active("alice@example.com", now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id(), record.id());
    }

    #[tokio::test]
    async fn test_delete_user_and_verification() {
        let store = InMemoryStore::new();
        let user = UserRepository::save(&store, new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let record = VerificationRepository::save(&store, new_verification("a@x.io", now()))
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, user.id()).await.unwrap());
        assert!(!UserRepository::delete(&store, user.id()).await.unwrap());
        assert!(VerificationRepository::delete(&store, record.id()).await.unwrap());
        assert!(!VerificationRepository::delete(&store, record.id()).await.unwrap());

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.count_recent("a@x.io", now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_missing_user() {
        let store = InMemoryStore::new();
        let record = VerificationRepository::save(&store, new_verification("ghost@x.io", now()))
            .await
            .unwrap();

        let result = store.activate(record.id(), "ghost@x.io", now()).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_todos_scoped_to_owner() {
        let store = InMemoryStore::new();
        let alice = UserId::new(1);
        let bob = UserId::new(2);

        let todo = TodoRepository::create(&store, new_todo(alice, "Buy milk", now()))
            .await
            .unwrap();
        TodoRepository::create(&store, new_todo(bob, "Walk dog", now()))
            .await
            .unwrap();

        assert_eq!(store.find_by_user(alice).await.unwrap().len(), 1);
        assert!(store
            .find_by_id_and_user(todo.id(), bob)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_by_id_and_user(todo.id(), bob).await.unwrap());
        assert!(store.delete_by_id_and_user(todo.id(), alice).await.unwrap());
        assert!(store.find_by_user(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_user_newest_first() {
        let store = InMemoryStore::new();
        let alice = UserId::new(1);
        TodoRepository::create(&store, new_todo(alice, "first", now()))
            .await
            .unwrap();
        TodoRepository::create(&store, new_todo(alice, "second", now() + Duration::hours(1)))
            .await
            .unwrap();

        let titles: Vec<_> = store
            .find_by_user(alice)
            .await
            .unwrap()
            .iter()
            .map(|t| t.title().to_string())
            .collect();

        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_update_and_search() {
        let store = InMemoryStore::new();
        let alice = UserId::new(1);
        let mut todo = TodoRepository::create(&store, new_todo(alice, "Groceries", now()))
            .await
            .unwrap();

        todo.set_description(Some("Buy MILK and eggs".to_string()), now());
        store.update(&todo).await.unwrap();

        assert_eq!(store.search(alice, "milk").await.unwrap().len(), 1);
        assert!(store.search(alice, "bread").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_todo() {
        let store = InMemoryStore::new();
        let todo = Todo::with_id(TodoId::new(42), new_todo(UserId::new(1), "gone", now()));

        let result = store.update(&todo).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
