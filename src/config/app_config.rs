use std::fmt::Debug;

use serde::Deserialize;

use crate::infrastructure::observability::MetricsConfig;

/// Largest accepted TTL, window or interval: ten years
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Falls back to the `DATABASE_URL` environment variable
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Falls back to the `JWT_SECRET` environment variable
    pub jwt_secret: Option<String>,
    pub issuer: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub code_ttl_secs: u64,
    pub max_attempts: u32,
    pub rate_limit_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    /// Write notifications to the log instead of sending them
    #[default]
    Log,
    Smtp,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub use_starttls: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "todo-app".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 604_800,
        }
    }
}

impl Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[hidden]"))
            .field("issuer", &self.issuer)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: 600,
            max_attempts: 5,
            rate_limit_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

impl VerificationConfig {
    pub fn code_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.code_ttl_secs as i64)
    }

    pub fn rate_limit_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.rate_limit_secs as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransport::default(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            from_address: "noreply@todoapp.local".to_string(),
            from_name: "Todo App".to_string(),
            use_starttls: true,
            timeout_secs: 30,
        }
    }
}

impl Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("transport", &self.transport)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[hidden]"))
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("use_starttls", &self.use_starttls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;

        Ok(app)
    }

    /// Reject durations too large to add to a timestamp
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let durations = [
            ("auth.access_token_ttl_secs", self.auth.access_token_ttl_secs),
            ("auth.refresh_token_ttl_secs", self.auth.refresh_token_ttl_secs),
            ("verification.code_ttl_secs", self.verification.code_ttl_secs),
            ("verification.rate_limit_secs", self.verification.rate_limit_secs),
            ("verification.sweep_interval_secs", self.verification.sweep_interval_secs),
        ];

        for (key, secs) in durations {
            if secs > MAX_DURATION_SECS {
                return Err(config::ConfigError::Message(format!(
                    "{} must be at most {} seconds, got {}",
                    key, MAX_DURATION_SECS, secs
                )));
            }
        }

        Ok(())
    }

    /// Configured secret, else `JWT_SECRET` from the environment
    pub fn jwt_secret(&self) -> Option<String> {
        self.auth
            .jwt_secret
            .clone()
            .or_else(|| std::env::var("JWT_SECRET").ok())
            .filter(|s| !s.is_empty())
    }

    /// Configured URL, else `DATABASE_URL` from the environment
    pub fn database_url(&self) -> Option<String> {
        self.storage
            .database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.auth.issuer, "todo-app");
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.auth.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.verification.code_ttl_secs, 600);
        assert_eq!(config.verification.max_attempts, 5);
        assert_eq!(config.verification.rate_limit_secs, 60);
        assert_eq!(config.verification.sweep_interval_secs, 300);
        assert_eq!(config.email.transport, EmailTransport::Log);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "server": { "port": 9090 },
            "storage": { "backend": "postgres" },
            "verification": { "max_attempts": 3 }
        }))
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.verification.max_attempts, 3);
        assert_eq!(config.verification.code_ttl_secs, 600);
    }

    #[test]
    fn test_verification_durations() {
        let config = VerificationConfig::default();

        assert_eq!(config.code_ttl(), chrono::Duration::minutes(10));
        assert_eq!(config.rate_limit_window(), chrono::Duration::minutes(1));
        assert_eq!(config.sweep_interval(), std::time::Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        assert!(AppConfig::default().validate().is_ok());

        let mut config = AppConfig::default();
        config.auth.refresh_token_ttl_secs = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.refresh_token_ttl_secs"));

        let mut config = AppConfig::default();
        config.verification.rate_limit_secs = MAX_DURATION_SECS + 1;
        assert!(config.validate().is_err());

        config.verification.rate_limit_secs = MAX_DURATION_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("super-secret-signing-key".to_string());
        config.email.password = Some("smtp-password".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-signing-key"));
        assert!(!debug.contains("smtp-password"));
    }
}
