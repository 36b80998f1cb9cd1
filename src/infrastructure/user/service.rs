//! Authentication flow: registration, login and request authentication

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::user::{
    validate_email, validate_name, validate_password, validate_username, NewUser, User,
    UserRepository, ROLE_ADMIN,
};
use crate::domain::{Clock, DomainError, Principal, RequestContext};
use crate::infrastructure::auth::{AuthSession, TokenCodec, TokenKind};
use crate::infrastructure::observability::record_login;
use crate::infrastructure::verification::VerificationService;

use super::password::PasswordHasher;

/// Request for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Login by username or email address
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Collaborators of the authentication flow
pub struct AuthServiceDeps {
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenCodec>,
    pub verification: Arc<VerificationService>,
    pub clock: Arc<dyn Clock>,
}

/// Authentication flow service
#[derive(Debug)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
    verification: Arc<VerificationService>,
    clock: Arc<dyn Clock>,
}

/// Addresses compare case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(deps: AuthServiceDeps) -> Self {
        Self {
            users: deps.users,
            hasher: deps.hasher,
            tokens: deps.tokens,
            verification: deps.verification,
            clock: deps.clock,
        }
    }

    /// Create a disabled, unverified account and send its verification code
    pub async fn register(&self, request: RegisterRequest) -> Result<User, DomainError> {
        let username = request.username.trim();
        let email = normalize_email(&request.email);
        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();

        validate_username(username).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name("First name", first_name)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name("Last name", last_name)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        if self.users.exists_by_username(username).await? {
            return Err(DomainError::conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        if self.users.exists_by_email(&email).await? {
            return Err(DomainError::conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        if self
            .users
            .exists_by_first_name_and_last_name(first_name, last_name)
            .await?
        {
            return Err(DomainError::conflict(format!(
                "A user named '{} {}' already exists",
                first_name, last_name
            )));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let user = self
            .users
            .save(NewUser::registration(
                username,
                &email,
                password_hash,
                first_name,
                last_name,
                self.clock.now(),
            ))
            .await?;

        // The account only exists once its code has gone out
        if let Err(e) = self
            .verification
            .send(user.email(), user.display_name())
            .await
        {
            if let Err(rollback) = self.users.delete(user.id()).await {
                error!(
                    user_id = %user.id(),
                    error = %rollback,
                    "Failed to roll back registration"
                );
            }
            return Err(e);
        }

        info!(user_id = %user.id(), username = %user.username(), "User registered");

        Ok(user)
    }

    /// Check credentials and hand out an access/refresh pair
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, DomainError> {
        let identifier = request.username_or_email.trim();

        let user = match self.users.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.users.find_by_email(&normalize_email(identifier)).await?,
        };

        let Some(user) = user else {
            self.hasher.verify_dummy(&request.password);
            record_login("invalid_credentials");
            debug!("Login attempt for unknown account");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.hasher.verify(&request.password, user.password_hash()) {
            record_login("invalid_credentials");
            warn!(user_id = %user.id(), "Login with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        if !user.is_email_verified() {
            record_login("email_not_verified");
            return Err(DomainError::EmailNotVerified);
        }

        if !user.is_enabled() {
            record_login("account_disabled");
            return Err(DomainError::AccountDisabled);
        }

        let tokens = self.tokens.issue_pair(&user)?;

        record_login("success");
        info!(user_id = %user.id(), username = %user.username(), "User logged in");

        Ok(AuthSession { user, tokens })
    }

    /// Profile of the authenticated caller
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<User, DomainError> {
        let principal = ctx.require_principal()?;

        self.users
            .find_by_id(principal.user_id())
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    /// Forget the caller. Tokens stay valid until they expire.
    pub fn logout(&self, ctx: &mut RequestContext) {
        if let Some(principal) = ctx.principal() {
            info!(user_id = %principal.user_id(), "User logged out");
        }
        ctx.clear();
    }

    /// Resolve a bearer token to a request context
    ///
    /// Every failure, from a bad signature to a disabled account, yields an
    /// anonymous context.
    pub async fn authenticate(&self, token: &str) -> RequestContext {
        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                return RequestContext::anonymous();
            }
        };

        if claims.token_type != TokenKind::Access {
            debug!("Refresh token presented as bearer credential");
            return RequestContext::anonymous();
        }

        let user = match self.users.find_by_username(claims.username()).await {
            Ok(Some(user)) => user,
            Ok(None) => return RequestContext::anonymous(),
            Err(e) => {
                warn!(error = %e, "Failed to load user for bearer token");
                return RequestContext::anonymous();
            }
        };

        if user.id() != claims.user_id() || !user.is_active() {
            return RequestContext::anonymous();
        }

        RequestContext::authenticated(Principal::from(&user))
    }

    /// Create the administrator account when no user exists yet
    pub async fn seed_admin(&self, password: &str) -> Result<Option<User>, DomainError> {
        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self
            .users
            .save(
                NewUser::registration(
                    "admin",
                    "admin@todoapp.local",
                    password_hash,
                    "Admin",
                    "User",
                    self.clock.now(),
                )
                .with_role(ROLE_ADMIN)
                .activated(),
            )
            .await?;

        Ok(Some(user))
    }

    pub fn verification(&self) -> &Arc<VerificationService> {
        &self.verification
    }
}
