//! Todo API
//!
//! Multi-tenant to-do lists behind JWT authentication:
//! - Registration with email verification codes
//! - Access and refresh tokens
//! - Per-user to-do CRUD, deadline views, statistics and search
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use config::{StorageBackend, VerificationConfig};
use domain::{Clock, NotificationSink, SystemClock};
use infrastructure::{
    auth::{JwtConfig, JwtService, TokenCodec},
    notification::build_notification_sink,
    storage::{connect_pool, run_storage_migrations, PostgresConfig, Repositories},
    todo::TodoService,
    user::{Argon2Hasher, AuthService, AuthServiceDeps},
    verification::{VerificationService, VerificationServiceDeps},
};
use rand::Rng;
use tracing::{info, warn};

/// Wire the services over a set of repositories
pub fn build_app_state(
    repositories: &Repositories,
    tokens: Arc<dyn TokenCodec>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    verification_config: VerificationConfig,
) -> AppState {
    let verification = Arc::new(VerificationService::new(
        VerificationServiceDeps {
            records: repositories.verifications.clone(),
            users: repositories.users.clone(),
            activator: repositories.activator.clone(),
            tokens: tokens.clone(),
            notifier,
            clock: clock.clone(),
        },
        verification_config,
    ));

    let auth = Arc::new(AuthService::new(AuthServiceDeps {
        users: repositories.users.clone(),
        hasher: Arc::new(Argon2Hasher::new()),
        tokens,
        verification: verification.clone(),
        clock: clock.clone(),
    }));

    let todos = Arc::new(TodoService::new(repositories.todos.clone(), clock));

    AppState {
        auth,
        verification,
        todos,
        users: repositories.users.clone(),
    }
}

/// Create the application state with the default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let repositories = create_repositories(config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let jwt_config = JwtConfig::new(resolve_jwt_secret(config), config.auth.issuer.clone())
        .with_ttls(
            config.auth.access_token_ttl_secs,
            config.auth.refresh_token_ttl_secs,
        );
    let tokens = Arc::new(
        JwtService::new(jwt_config, clock.clone())
            .map_err(|e| anyhow::anyhow!("Invalid JWT configuration: {}", e))?,
    );

    let code_ttl_minutes = config.verification.code_ttl_secs.div_ceil(60);
    let notifier = build_notification_sink(&config.email, code_ttl_minutes)
        .map_err(|e| anyhow::anyhow!("Failed to create notification sink: {}", e))?;

    info!(transport = ?config.email.transport, "Notification sink ready");

    Ok(build_app_state(
        &repositories,
        tokens,
        notifier,
        clock,
        config.verification.clone(),
    ))
}

async fn create_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    info!("Storage backend: {:?}", config.storage.backend);

    match config.storage.backend {
        StorageBackend::Memory => Ok(Repositories::in_memory()),
        StorageBackend::Postgres => {
            let url = config.database_url().ok_or_else(|| {
                anyhow::anyhow!(
                    "storage.database_url or DATABASE_URL is required for the postgres backend"
                )
            })?;

            info!("Connecting to PostgreSQL...");
            let pool = connect_pool(
                &PostgresConfig::new(url).with_max_connections(config.storage.max_connections),
            )
            .await?;
            info!("PostgreSQL connection established");

            run_storage_migrations(&pool).await?;

            Ok(Repositories::postgres(pool))
        }
    }
}

/// Generate a random JWT secret
fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Secret from config or `JWT_SECRET`, else a random one
fn resolve_jwt_secret(config: &AppConfig) -> String {
    config.jwt_secret().unwrap_or_else(|| {
        warn!(
            "No JWT_SECRET configured. Generating random secret. \
            Tokens will NOT survive a restart."
        );
        generate_random_secret()
    })
}

/// Generate a random password for the initial admin user
fn generate_random_password() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Create the administrator account if no users exist
pub async fn create_initial_admin_user(state: &AppState) -> anyhow::Result<()> {
    // ADMIN_DEFAULT_PASSWORD wins over a generated password
    let (password, is_default) = match std::env::var("ADMIN_DEFAULT_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, true),
        _ => (generate_random_password(), false),
    };

    let Some(admin) = state.auth.seed_admin(&password).await? else {
        return Ok(());
    };

    info!("===========================================");
    info!("Initial admin user created!");
    info!("Username: {}", admin.username());
    info!("Email: {}", admin.email());

    if is_default {
        info!("Password: (set via ADMIN_DEFAULT_PASSWORD)");
    } else {
        info!("Password: {}", password);
    }

    info!("Please change this password after first login.");
    info!("===========================================");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_secret() {
        let secret = generate_random_secret();

        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_random_secret());
    }

    #[test]
    fn test_generate_random_password() {
        assert_eq!(generate_random_password().len(), 16);
    }

    #[test]
    fn test_resolve_configured_secret() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("configured-secret-with-enough-length!".to_string());

        assert_eq!(
            resolve_jwt_secret(&config),
            "configured-secret-with-enough-length!"
        );
    }

    #[tokio::test]
    async fn test_create_app_state_and_seed_admin() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("state-test-secret-that-is-long-enough".to_string());

        let state = create_app_state_with_config(&config).await.unwrap();

        create_initial_admin_user(&state).await.unwrap();
        create_initial_admin_user(&state).await.unwrap();

        assert_eq!(state.users.count().await.unwrap(), 1);
        let admin = state.users.find_by_username("admin").await.unwrap().unwrap();
        assert!(admin.is_active());
    }
}
