//! Storage infrastructure - backends for every repository

mod in_memory;
pub mod migrations;
mod postgres;

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::todo::TodoRepository;
use crate::domain::user::UserRepository;
use crate::domain::verification::{AccountActivator, VerificationRepository};
use crate::infrastructure::todo::PostgresTodoRepository;
use crate::infrastructure::user::PostgresUserRepository;
use crate::infrastructure::verification::{
    PostgresAccountActivator, PostgresVerificationRepository,
};

pub use in_memory::InMemoryStore;
pub use migrations::{run_storage_migrations, Migration, PostgresMigrator};
pub(crate) use postgres::is_unique_violation;
pub use postgres::{connect_pool, PostgresConfig};

/// One handle per repository trait, all backed by the same store
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub activator: Arc<dyn AccountActivator>,
    pub todos: Arc<dyn TodoRepository>,
}

impl Repositories {
    /// Process-local storage; everything is lost on exit
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryStore::new())
    }

    pub fn from_store(store: InMemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            verifications: Arc::new(store.clone()),
            activator: Arc::new(store.clone()),
            todos: Arc::new(store),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            verifications: Arc::new(PostgresVerificationRepository::new(pool.clone())),
            activator: Arc::new(PostgresAccountActivator::new(pool.clone())),
            todos: Arc::new(PostgresTodoRepository::new(pool)),
        }
    }
}
