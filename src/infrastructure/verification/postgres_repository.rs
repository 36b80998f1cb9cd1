//! PostgreSQL verification record storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::user::User;
use crate::domain::verification::{
    AccountActivator, NewVerification, VerificationId, VerificationRecord, VerificationRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::user::{row_to_user, USER_COLUMNS};

/// PostgreSQL implementation of VerificationRepository
#[derive(Debug, Clone)]
pub struct PostgresVerificationRepository {
    pool: PgPool,
}

impl PostgresVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PostgresVerificationRepository {
    async fn find_active(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, code, expires_at, verified, attempts, created_at
            FROM email_verifications
            WHERE email = $1 AND expires_at > $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get verification: {}", e)))?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn count_recent(&self, email: &str, since: DateTime<Utc>) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM email_verifications WHERE email = $1 AND created_at >= $2",
        )
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count verifications: {}", e)))?;

        Ok(count.max(0) as u64)
    }

    async fn save(&self, record: NewVerification) -> Result<VerificationRecord, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO email_verifications (email, code, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&record.email)
        .bind(&record.code)
        .bind(record.expires_at)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create verification: {}", e)))?;

        Ok(VerificationRecord::with_id(VerificationId::new(id), record))
    }

    async fn delete(&self, id: VerificationId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete verification: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_attempts(&self, id: VerificationId) -> Result<Option<u32>, DomainError> {
        let attempts: Option<i32> = sqlx::query_scalar(
            "UPDATE email_verifications SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to increment attempts: {}", e)))?;

        Ok(attempts.map(|a| a.max(0) as u32))
    }

    async fn delete_verified(&self, email: &str) -> Result<u64, DomainError> {
        let result =
            sqlx::query("DELETE FROM email_verifications WHERE email = $1 AND verified = TRUE")
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to delete verified records: {}", e))
                })?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE expires_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete expired records: {}", e)))?;

        Ok(result.rows_affected())
    }
}

/// Activates accounts inside one database transaction
#[derive(Debug, Clone)]
pub struct PostgresAccountActivator {
    pool: PgPool,
}

impl PostgresAccountActivator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountActivator for PostgresAccountActivator {
    async fn activate(
        &self,
        record_id: VerificationId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let tx_error =
            |e: sqlx::Error| DomainError::storage(format!("Failed to activate account: {}", e));

        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        // Lock the record so a concurrent sweep or verify waits for this transaction
        let verified: Option<bool> = sqlx::query_scalar(
            "SELECT verified FROM email_verifications WHERE id = $1 AND expires_at > $2 FOR UPDATE",
        )
        .bind(record_id.value())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(tx_error)?;

        match verified {
            None => return Err(DomainError::InvalidOrExpiredCode),
            Some(true) => return Err(DomainError::AlreadyVerified),
            Some(false) => {}
        }

        sqlx::query(
            "DELETE FROM email_verifications WHERE email = $1 AND verified = TRUE AND id <> $2",
        )
        .bind(email)
        .bind(record_id.value())
        .execute(&mut *tx)
        .await
        .map_err(tx_error)?;

        sqlx::query("UPDATE email_verifications SET verified = TRUE WHERE id = $1")
            .bind(record_id.value())
            .execute(&mut *tx)
            .await
            .map_err(tx_error)?;

        let sql = format!(
            "UPDATE users SET email_verified = TRUE, enabled = TRUE, updated_at = $2 \
             WHERE email = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(tx_error)?;

        // Dropping the transaction without commit rolls back the record update
        let Some(row) = row else {
            return Err(DomainError::not_found(format!(
                "No user with email '{}'",
                email
            )));
        };
        let user = row_to_user(&row)?;

        tx.commit().await.map_err(tx_error)?;

        Ok(user)
    }
}

fn row_to_record(row: &PgRow) -> Result<VerificationRecord, DomainError> {
    let column = |e: sqlx::Error| DomainError::storage(format!("Invalid verification row: {}", e));

    let id: i64 = row.try_get("id").map_err(column)?;
    let verified: bool = row.try_get("verified").map_err(column)?;
    let attempts: i32 = row.try_get("attempts").map_err(column)?;
    let code: String = row.try_get("code").map_err(column)?;

    let new = NewVerification {
        email: row.try_get("email").map_err(column)?,
        code: code.trim().to_string(),
        expires_at: row.try_get("expires_at").map_err(column)?,
        created_at: row.try_get("created_at").map_err(column)?,
    };

    Ok(VerificationRecord::restore(
        VerificationId::new(id),
        new,
        verified,
        attempts.max(0) as u32,
    ))
}
