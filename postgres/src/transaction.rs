//! Transaction demarcation for the booking pipeline.
//!
//! The coordinator owns the begin/commit/rollback discipline: every
//! reservation runs inside exactly one transaction, which ends in exactly one
//! commit or one rollback, and the underlying connection goes back to the
//! pool on every path. Dropping an uncommitted [`sqlx::Transaction`] rolls it
//! back, so even a panicking or cancelled caller cannot leak an open
//! transaction.

use std::time::Duration;

use boxoffice_core::{BookingError, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

/// Transaction isolation level applied to every reservation transaction.
///
/// `ReadCommitted` is the default and the recommended setting: combined with
/// the guard's `FOR UPDATE` row lock it already guarantees that a blocked
/// competitor re-reads the latest committed counts once it acquires the lock.
/// The stricter levels keep the same correctness but turn blocked competitors
/// into serialization failures (SQLSTATE 40001), which surface as retryable
/// [`BookingError::DatabaseError`]s instead of clean capacity rejections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    /// Postgres default; row locks carry the consistency guarantee.
    #[default]
    ReadCommitted,
    /// Snapshot isolation; lock waiters abort on conflicting commits.
    RepeatableRead,
    /// Full serializability; highest abort rate under contention.
    Serializable,
}

impl IsolationLevel {
    /// SQL fragment for `SET TRANSACTION ISOLATION LEVEL`.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        }
    }

    /// Parse a level from a configuration string.
    ///
    /// Accepts the SQL spelling in any case, with spaces, dashes, or
    /// underscores (`"read committed"`, `"REPEATABLE-READ"`,
    /// `"serializable"`). Returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "read committed" => Some(Self::ReadCommitted),
            "repeatable read" => Some(Self::RepeatableRead),
            "serializable" => Some(Self::Serializable),
            _ => None,
        }
    }
}

/// Options applied at the start of every reservation transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Isolation level for the transaction.
    pub isolation: IsolationLevel,
    /// Bound on how long a lock acquisition may wait. `None` (the default)
    /// waits for the current holder to finish, however long that takes;
    /// `Some` turns a longer wait into [`BookingError::InventoryBusy`].
    pub lock_timeout: Option<Duration>,
}

impl TransactionOptions {
    /// Options with an explicit isolation level and no lock bound.
    #[must_use]
    pub const fn with_isolation(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            lock_timeout: None,
        }
    }

    /// Returns these options with a bounded lock wait.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

/// Owns transaction demarcation for the booking store.
///
/// Connection source and options are passed in explicitly; nothing is read
/// from ambient process state.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    pool: PgPool,
    options: TransactionOptions,
}

impl TransactionCoordinator {
    /// Creates a coordinator over the given pool and options.
    #[must_use]
    pub const fn new(pool: PgPool, options: TransactionOptions) -> Self {
        Self { pool, options }
    }

    /// The options applied to every transaction this coordinator begins.
    #[must_use]
    pub const fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Begins a transaction and applies the configured session settings.
    ///
    /// The isolation level is set explicitly even when it matches the server
    /// default, so the guarantee does not depend on server configuration.
    /// `SET LOCAL lock_timeout` scopes the lock bound to this transaction
    /// only. If applying either setting fails, the transaction is dropped
    /// (and thereby rolled back) before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DatabaseError`] when no connection could be
    /// acquired or the session settings could not be applied.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            BookingError::DatabaseError(format!("Failed to start transaction: {e}"))
        })?;

        let isolation = format!(
            "SET TRANSACTION ISOLATION LEVEL {}",
            self.options.isolation.as_sql()
        );
        sqlx::query(&isolation)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                BookingError::DatabaseError(format!("Failed to set isolation level: {e}"))
            })?;

        if let Some(timeout) = self.options.lock_timeout {
            let lock_timeout = format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis());
            sqlx::query(&lock_timeout)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    BookingError::DatabaseError(format!("Failed to set lock timeout: {e}"))
                })?;
        }

        Ok(tx)
    }

    /// Commits the transaction, making its writes durable and visible.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DatabaseError`] when the commit fails; the
    /// transaction is gone either way and nothing was made visible.
    pub async fn commit(&self, tx: Transaction<'static, Postgres>) -> Result<()> {
        tx.commit()
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Failed to commit transaction: {e}")))
    }

    /// Rolls the transaction back, discarding its writes.
    ///
    /// Rollback failures are logged rather than returned: the caller is
    /// already on an error path and the original failure is the one that
    /// must surface. A connection whose rollback failed is discarded by the
    /// pool instead of being reused.
    pub async fn rollback(&self, tx: Transaction<'static, Postgres>) {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "rollback failed; connection will not be reused");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(
            IsolationLevel::parse("read committed"),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            IsolationLevel::parse("READ_COMMITTED"),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(
            IsolationLevel::parse("Repeatable-Read"),
            Some(IsolationLevel::RepeatableRead)
        );
        assert_eq!(
            IsolationLevel::parse("serializable"),
            Some(IsolationLevel::Serializable)
        );
        assert_eq!(IsolationLevel::parse("snapshot"), None);
    }

    #[test]
    fn sql_spelling_round_trips_through_parse() {
        for level in [
            IsolationLevel::ReadCommitted,
            IsolationLevel::RepeatableRead,
            IsolationLevel::Serializable,
        ] {
            assert_eq!(IsolationLevel::parse(level.as_sql()), Some(level));
        }
    }

    #[test]
    fn default_options_wait_indefinitely_at_read_committed() {
        let options = TransactionOptions::default();
        assert_eq!(options.isolation, IsolationLevel::ReadCommitted);
        assert_eq!(options.lock_timeout, None);
    }

    #[test]
    fn lock_timeout_builder_sets_bound() {
        let options = TransactionOptions::with_isolation(IsolationLevel::Serializable)
            .with_lock_timeout(Duration::from_millis(250));
        assert_eq!(options.isolation, IsolationLevel::Serializable);
        assert_eq!(options.lock_timeout, Some(Duration::from_millis(250)));
    }
}
