//! Outbound account notifications

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Delivers account emails. Failures surface as `DomainError::Notification`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send the 6-digit verification code to a newly registered address
    async fn send_verification_code(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), DomainError>;

    /// Greet a user whose address has just been verified
    async fn send_welcome(&self, email: &str, name: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_notification_sink() {
        let mut mock = MockNotificationSink::new();
        mock.expect_send_verification_code()
            .withf(|email, _, code| email.to_string() == "alice@example.com" && code.len() == 6)
            .times(1)
            .returning(|_, _, _| Ok(()));
        mock.expect_send_welcome()
            .returning(|_, _| Err(DomainError::notification("relay refused")));

        assert!(mock
            .send_verification_code("alice@example.com", "Alice", "123456")
            .await
            .is_ok());
        assert!(mock.send_welcome("alice@example.com", "Alice").await.is_err());
    }
}
