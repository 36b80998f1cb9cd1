//! SMTP notification sink

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use crate::config::EmailConfig;
use crate::domain::{DomainError, NotificationSink};

use super::templates::{verification_email, welcome_email, EmailContent};

/// Delivers account emails through an SMTP relay
pub struct SmtpNotificationSink {
    transport: SmtpTransport,
    from: Mailbox,
    code_ttl_minutes: u64,
}

impl std::fmt::Debug for SmtpNotificationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotificationSink")
            .field("from", &self.from.to_string())
            .field("code_ttl_minutes", &self.code_ttl_minutes)
            .finish_non_exhaustive()
    }
}

impl SmtpNotificationSink {
    pub fn new(config: &EmailConfig, code_ttl_minutes: u64) -> Result<Self, DomainError> {
        Ok(Self {
            transport: build_transport(config)?,
            from: sender_mailbox(config)?,
            code_ttl_minutes,
        })
    }

    async fn deliver(&self, to: &str, content: EmailContent) -> Result<(), DomainError> {
        debug!(to = %to, subject = content.subject, "Sending email");

        let message = build_message(&self.from, to, &content)?;
        let transport = self.transport.clone();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| DomainError::notification(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| DomainError::notification(format!("Email task failed: {}", e)))??;

        info!(to = %to, subject = content.subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for SmtpNotificationSink {
    async fn send_verification_code(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), DomainError> {
        self.deliver(email, verification_email(name, code, self.code_ttl_minutes))
            .await
    }

    async fn send_welcome(&self, email: &str, name: &str) -> Result<(), DomainError> {
        self.deliver(email, welcome_email(name)).await
    }
}

fn build_transport(config: &EmailConfig) -> Result<SmtpTransport, DomainError> {
    let builder = if config.use_starttls {
        SmtpTransport::starttls_relay(&config.smtp_host)
    } else {
        SmtpTransport::relay(&config.smtp_host)
    }
    .map_err(|e| DomainError::internal(format!("Failed to create SMTP transport: {}", e)))?
    .port(config.smtp_port)
    .timeout(Some(Duration::from_secs(config.timeout_secs)));

    let builder = match (&config.username, &config.password) {
        (Some(username), Some(password)) => {
            builder.credentials(Credentials::new(username.clone(), password.clone()))
        }
        _ => builder,
    };

    Ok(builder.build())
}

fn sender_mailbox(config: &EmailConfig) -> Result<Mailbox, DomainError> {
    format!("{} <{}>", config.from_name, config.from_address)
        .parse()
        .map_err(|e| DomainError::internal(format!("Invalid from address: {}", e)))
}

fn build_message(from: &Mailbox, to: &str, content: &EmailContent) -> Result<Message, DomainError> {
    let to: Mailbox = to
        .parse()
        .map_err(|e| DomainError::notification(format!("Invalid recipient address: {}", e)))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(content.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(content.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(content.html_body.clone()),
                ),
        )
        .map_err(|e| DomainError::notification(format!("Failed to build message: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_mailbox_from_config() {
        let mailbox = sender_mailbox(&EmailConfig::default()).unwrap();

        assert_eq!(mailbox.email.to_string(), "noreply@todoapp.local");
        assert_eq!(mailbox.name.as_deref(), Some("Todo App"));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let config = EmailConfig {
            from_address: "not an address".to_string(),
            ..EmailConfig::default()
        };

        assert!(matches!(
            sender_mailbox(&config),
            Err(DomainError::Internal { .. })
        ));
    }

    #[test]
    fn test_build_message() {
        let from = sender_mailbox(&EmailConfig::default()).unwrap();
        let content = verification_email("Alice", "123456", 10);

        let message = build_message(&from, "alice@example.com", &content).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Email Verification - Todo App"));
        assert!(raw.contains("To: alice@example.com"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let from = sender_mailbox(&EmailConfig::default()).unwrap();
        let content = welcome_email("Alice");

        let result = build_message(&from, "nope", &content);

        assert!(matches!(result, Err(DomainError::Notification { .. })));
    }

    #[test]
    fn test_sink_builds_without_connecting() {
        let sink = SmtpNotificationSink::new(&EmailConfig::default(), 10).unwrap();

        assert!(format!("{:?}", sink).contains("noreply@todoapp.local"));
    }
}
