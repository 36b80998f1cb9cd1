//! Verification storage traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{NewVerification, VerificationId, VerificationRecord};
use crate::domain::user::User;
use crate::domain::DomainError;

/// Repository for verification records
#[async_trait]
pub trait VerificationRepository: Send + Sync + Debug {
    /// Most recently created record for `email` that has not expired at `now`,
    /// verified or not
    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>, DomainError>;

    /// Number of records created for `email` at or after `since`
    async fn count_recent(&self, email: &str, since: DateTime<Utc>) -> Result<u64, DomainError>;

    async fn save(&self, record: NewVerification) -> Result<VerificationRecord, DomainError>;

    /// Delete one record. Returns true if it existed.
    async fn delete(&self, id: VerificationId) -> Result<bool, DomainError>;

    /// Atomically bump the attempts counter and return the new value.
    /// `None` when the record no longer exists.
    async fn increment_attempts(&self, id: VerificationId) -> Result<Option<u32>, DomainError>;

    /// Delete every verified record for `email`, returning how many were removed
    async fn delete_verified(&self, email: &str) -> Result<u64, DomainError>;

    /// Delete every record whose expiry is strictly before `before`
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, DomainError>;
}

/// Applies a successful verification as one all-or-nothing unit
#[async_trait]
pub trait AccountActivator: Send + Sync + Debug {
    /// Within a single transaction: confirm the record still exists, is not yet
    /// verified and has not expired at `now`, delete older verified records for
    /// `email`, mark the record verified and flip the owning user to verified
    /// and enabled.
    ///
    /// Fails with `InvalidOrExpiredCode` when the record vanished or expired,
    /// `AlreadyVerified` when another activation won the race and `NotFound`
    /// when no user owns `email`; nothing is written in any of these cases.
    async fn activate(
        &self,
        record_id: VerificationId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError>;
}
