//! JWT token generation and validation

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_DURATION_SECS;
use crate::domain::user::{User, UserId};
use crate::domain::{Clock, DomainError};

/// HS256 needs at least 256 bits of key material
pub const MIN_SECRET_LENGTH: usize = 32;

/// Access tokens authenticate requests; refresh tokens are long-lived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (username)
    pub sub: String,
    pub user_id: i64,
    pub roles: BTreeSet<String>,
    pub token_type: TokenKind,
    pub iss: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl JwtClaims {
    fn new(user: &User, kind: TokenKind, issuer: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user.username().to_string(),
            user_id: user.id().value(),
            roles: user.roles(),
            token_type: kind,
            iss: issuer.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Expired once `now` reaches `exp`; no leeway
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_id)
    }

    pub fn username(&self) -> &str {
        &self.sub
    }
}

/// Why a presented token was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token has expired")]
    Expired,
}

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
        }
    }

    pub fn with_ttls(mut self, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_secs = refresh_ttl_secs;
        self
    }
}

/// Access and refresh tokens handed out together
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Trait for token operations
pub trait TokenCodec: Send + Sync + Debug {
    /// Sign a token of the given kind for `user`
    fn issue(&self, user: &User, kind: TokenKind) -> Result<String, DomainError>;

    /// Check signature, issuer and expiry, returning the embedded claims
    fn verify(&self, token: &str) -> Result<JwtClaims, TokenError>;

    /// Configured lifetime of a token kind, in seconds
    fn ttl_secs(&self, kind: TokenKind) -> u64;

    /// Token verifies and was issued to `expected_username`
    fn is_valid(&self, token: &str, expected_username: &str) -> bool {
        self.verify(token)
            .is_ok_and(|claims| claims.sub == expected_username)
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair, DomainError> {
        Ok(TokenPair {
            access_token: self.issue(user, TokenKind::Access)?,
            refresh_token: self.issue(user, TokenKind::Refresh)?,
            token_type: "Bearer",
            expires_in: self.ttl_secs(TokenKind::Access),
        })
    }
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Derive the signing keys once. Fails when the secret is too short for HS256.
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        if config.secret.is_empty() {
            return Err(DomainError::signing("JWT secret must not be empty"));
        }

        if config.secret.len() < MIN_SECRET_LENGTH {
            return Err(DomainError::signing(format!(
                "JWT secret must be at least {} bytes for HS256, got {}",
                MIN_SECRET_LENGTH,
                config.secret.len()
            )));
        }

        let longest_ttl = config.access_ttl_secs.max(config.refresh_ttl_secs);
        if longest_ttl > MAX_DURATION_SECS {
            return Err(DomainError::signing(format!(
                "Token lifetime must be at most {} seconds, got {}",
                MAX_DURATION_SECS, longest_ttl
            )));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against the injected clock after decoding
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
            clock,
        })
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        Duration::seconds(self.ttl_secs(kind) as i64)
    }
}

impl TokenCodec for JwtService {
    fn issue(&self, user: &User, kind: TokenKind) -> Result<String, DomainError> {
        let claims = JwtClaims::new(
            user,
            kind,
            &self.config.issuer,
            self.clock.now(),
            self.ttl(kind),
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::signing(format!("Failed to sign JWT: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if token_data.claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }

    fn ttl_secs(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Access => self.config.access_ttl_secs,
            TokenKind::Refresh => self.config.refresh_ttl_secs,
        }
    }
}
