use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invalid username/email or password")]
    InvalidCredentials,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("A verification code was sent recently. Please wait before requesting another one")]
    RateLimited,

    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Maximum verification attempts exceeded. Please request a new code")]
    AttemptsExceeded,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Notification error: {message}")]
    Notification { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Faults whose details must not reach API clients
    pub fn is_infrastructure_fault(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Notification { .. } | Self::Internal { .. } | Self::Signing { .. }
        )
    }
}
