//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, CorsConfig, EmailConfig, EmailTransport, LogFormat, LoggingConfig,
    ServerConfig, StorageBackend, StorageConfig, VerificationConfig, MAX_DURATION_SECS,
};
