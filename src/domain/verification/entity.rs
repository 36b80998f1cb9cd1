//! Email verification record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-generated verification record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(i64);

impl VerificationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for VerificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pending verification about to be persisted
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One verification code issued to an email address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    id: VerificationId,
    email: String,
    #[serde(skip_serializing)]
    code: String,
    expires_at: DateTime<Utc>,
    verified: bool,
    attempts: u32,
    created_at: DateTime<Utc>,
}

impl VerificationRecord {
    /// A freshly stored, pending record
    pub fn with_id(id: VerificationId, new: NewVerification) -> Self {
        Self {
            id,
            email: new.email,
            code: new.code,
            expires_at: new.expires_at,
            verified: false,
            attempts: 0,
            created_at: new.created_at,
        }
    }

    /// Rebuild a record loaded from storage
    pub fn restore(
        id: VerificationId,
        new: NewVerification,
        verified: bool,
        attempts: u32,
    ) -> Self {
        Self {
            verified,
            attempts,
            ..Self::with_id(id, new)
        }
    }

    pub fn id(&self) -> VerificationId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Expired once `now` reaches the expiry instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    /// Compare the stored code without short-circuiting on the first differing digit
    pub fn matches(&self, code: &str) -> bool {
        let stored = self.code.as_bytes();
        let given = code.as_bytes();

        if stored.len() != given.len() {
            return false;
        }

        stored
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    pub fn increment_attempts(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(now: DateTime<Utc>) -> VerificationRecord {
        VerificationRecord::with_id(
            VerificationId::new(1),
            NewVerification {
                email: "alice@example.com".to_string(),
                code: "042917".to_string(),
                expires_at: now + Duration::minutes(10),
                created_at: now,
            },
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let now = Utc::now();
        let record = record(now);

        assert!(!record.is_verified());
        assert_eq!(record.attempts(), 0);
        assert!(!record.is_expired(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let record = record(now);

        assert!(!record.is_expired(now + Duration::minutes(10) - Duration::seconds(1)));
        assert!(record.is_expired(now + Duration::minutes(10)));
    }

    #[test]
    fn test_code_matching() {
        let record = record(Utc::now());

        assert!(record.matches("042917"));
        assert!(!record.matches("042918"));
        assert!(!record.matches("42917"));
        assert!(!record.matches(""));
    }

    #[test]
    fn test_attempts() {
        let mut record = record(Utc::now());

        assert!(!record.attempts_exhausted(2));
        assert_eq!(record.increment_attempts(), 1);
        assert_eq!(record.increment_attempts(), 2);
        assert!(record.attempts_exhausted(2));
    }

    #[test]
    fn test_code_not_serialized() {
        let json = serde_json::to_string(&record(Utc::now())).unwrap();
        assert!(!json.contains("042917"));
    }
}
