//! Email verification flow

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::VerificationConfig;
use crate::domain::user::UserRepository;
use crate::domain::verification::{AccountActivator, NewVerification, VerificationRepository};
use crate::domain::{Clock, DomainError, NotificationSink};
use crate::infrastructure::auth::{AuthSession, TokenCodec};
use crate::infrastructure::observability::{
    record_notification_failure, record_sweep, record_verification,
};

use super::code::generate_code;

/// Collaborators of the verification flow
pub struct VerificationServiceDeps {
    pub records: Arc<dyn VerificationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub activator: Arc<dyn AccountActivator>,
    pub tokens: Arc<dyn TokenCodec>,
    pub notifier: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn Clock>,
}

/// Per-email state machine: no record, pending, then verified or expired
pub struct VerificationService {
    records: Arc<dyn VerificationRepository>,
    users: Arc<dyn UserRepository>,
    activator: Arc<dyn AccountActivator>,
    tokens: Arc<dyn TokenCodec>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: VerificationConfig,
}

impl std::fmt::Debug for VerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("records", &self.records)
            .field("users", &self.users)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VerificationService {
    pub fn new(deps: VerificationServiceDeps, config: VerificationConfig) -> Self {
        Self {
            records: deps.records,
            users: deps.users,
            activator: deps.activator,
            tokens: deps.tokens,
            notifier: deps.notifier,
            clock: deps.clock,
            config,
        }
    }

    /// Issue a fresh code for `email` and deliver it
    ///
    /// Fails with `RateLimited` when a record was created for the address
    /// within the rate-limit window. When delivery fails the new record is
    /// removed again, so an immediate retry is not rate limited.
    pub async fn send(&self, email: &str, display_name: &str) -> Result<(), DomainError> {
        let now = self.clock.now();

        let recent = self
            .records
            .count_recent(email, now - self.config.rate_limit_window())
            .await?;
        if recent > 0 {
            warn!(email = %email, "Verification code requested within rate-limit window");
            return Err(DomainError::RateLimited);
        }

        let code = generate_code();
        let record = self
            .records
            .save(NewVerification {
                email: email.to_string(),
                code: code.clone(),
                expires_at: now + self.config.code_ttl(),
                created_at: now,
            })
            .await?;

        if let Err(e) = self
            .notifier
            .send_verification_code(email, display_name, &code)
            .await
        {
            record_notification_failure("verification_code");
            warn!(email = %email, error = %e, "Failed to deliver verification code");

            if let Err(cleanup) = self.records.delete(record.id()).await {
                error!(
                    email = %email,
                    record_id = %record.id(),
                    error = %cleanup,
                    "Failed to discard undelivered verification record"
                );
            }
            return Err(e);
        }

        info!(
            email = %email,
            record_id = %record.id(),
            expires_at = %record.expires_at(),
            "Verification code sent"
        );

        Ok(())
    }

    /// Check `code` against the latest live record for `email` and activate the account
    pub async fn verify(&self, email: &str, code: &str) -> Result<AuthSession, DomainError> {
        let now = self.clock.now();

        let record = self
            .records
            .find_active(email, now)
            .await?
            .ok_or_else(|| {
                record_verification("invalid_or_expired");
                DomainError::InvalidOrExpiredCode
            })?;

        if record.is_verified() {
            record_verification("already_verified");
            return Err(DomainError::AlreadyVerified);
        }

        if record.attempts_exhausted(self.config.max_attempts) {
            record_verification("attempts_exceeded");
            return Err(DomainError::AttemptsExceeded);
        }

        let attempts = self
            .records
            .increment_attempts(record.id())
            .await?
            .ok_or(DomainError::InvalidOrExpiredCode)?;

        // Another request consumed the last attempt between the read and the increment
        if attempts > self.config.max_attempts {
            record_verification("attempts_exceeded");
            return Err(DomainError::AttemptsExceeded);
        }

        if !record.matches(code) {
            record_verification("invalid_code");
            warn!(email = %email, attempts, "Invalid verification code");
            return Err(DomainError::InvalidCode);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("No user with email '{}'", email)))?;

        let tokens = self.tokens.issue_pair(&user)?;

        let user = self
            .activator
            .activate(record.id(), email, self.clock.now())
            .await?;

        record_verification("success");
        info!(user_id = %user.id(), username = %user.username(), "Email verified");

        if let Err(e) = self
            .notifier
            .send_welcome(user.email(), user.display_name())
            .await
        {
            record_notification_failure("welcome");
            warn!(user_id = %user.id(), error = %e, "Failed to deliver welcome email");
        }

        Ok(AuthSession { user, tokens })
    }

    /// Replace any previous code for an unverified account with a new one
    pub async fn resend(&self, email: &str) -> Result<(), DomainError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("No user with email '{}'", email)))?;

        if user.is_email_verified() {
            return Err(DomainError::AlreadyVerified);
        }

        self.records.delete_verified(email).await?;
        self.send(email, user.display_name()).await
    }

    /// Delete every record that expired before now. Returns the number removed.
    pub async fn sweep(&self) -> Result<u64, DomainError> {
        let deleted = self.records.delete_expired(self.clock.now()).await?;

        if deleted > 0 {
            record_sweep(deleted);
            info!(deleted, "Removed expired verification records");
        }

        Ok(deleted)
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }
}
