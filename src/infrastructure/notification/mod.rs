//! Notification sinks for account emails

mod logging;
mod smtp;
mod templates;

use std::sync::Arc;

use crate::config::{EmailConfig, EmailTransport};
use crate::domain::{DomainError, NotificationSink};

pub use logging::LoggingNotificationSink;
pub use smtp::SmtpNotificationSink;
pub use templates::{verification_email, welcome_email, EmailContent};

/// Build the sink selected by `email.transport`
pub fn build_notification_sink(
    config: &EmailConfig,
    code_ttl_minutes: u64,
) -> Result<Arc<dyn NotificationSink>, DomainError> {
    match config.transport {
        EmailTransport::Log => Ok(Arc::new(LoggingNotificationSink::new(code_ttl_minutes))),
        EmailTransport::Smtp => Ok(Arc::new(SmtpNotificationSink::new(
            config,
            code_ttl_minutes,
        )?)),
    }
}
