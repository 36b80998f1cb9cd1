//! Notification sink that writes to the log

use async_trait::async_trait;
use tracing::info;

use crate::domain::{DomainError, NotificationSink};

use super::templates::{verification_email, welcome_email};

/// Development sink: nothing leaves the process, the code is visible in the log
#[derive(Debug, Clone)]
pub struct LoggingNotificationSink {
    code_ttl_minutes: u64,
}

impl LoggingNotificationSink {
    pub fn new(code_ttl_minutes: u64) -> Self {
        Self { code_ttl_minutes }
    }
}

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn send_verification_code(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), DomainError> {
        let content = verification_email(name, code, self.code_ttl_minutes);
        info!(
            to = %email,
            subject = content.subject,
            code = %code,
            "Verification email (not sent, log transport)"
        );
        Ok(())
    }

    async fn send_welcome(&self, email: &str, name: &str) -> Result<(), DomainError> {
        let content = welcome_email(name);
        info!(to = %email, subject = content.subject, "Welcome email (not sent, log transport)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sink_always_succeeds() {
        let sink = LoggingNotificationSink::new(10);

        assert!(sink
            .send_verification_code("alice@example.com", "Alice", "123456")
            .await
            .is_ok());
        assert!(sink.send_welcome("alice@example.com", "Alice").await.is_ok());
    }
}
