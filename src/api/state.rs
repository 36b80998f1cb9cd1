//! Application state for shared services

use std::sync::Arc;

use crate::domain::user::UserRepository;
use crate::infrastructure::todo::TodoService;
use crate::infrastructure::user::AuthService;
use crate::infrastructure::verification::VerificationService;

/// Services shared by every handler; cheap to clone
#[derive(Debug, Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub verification: Arc<VerificationService>,
    pub todos: Arc<TodoService>,
    /// Probed by the readiness check
    pub users: Arc<dyn UserRepository>,
}
