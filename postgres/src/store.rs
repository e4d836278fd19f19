//! The production booking store and user directory.
//!
//! [`PostgresBookingStore`] wires the transaction coordinator, the inventory
//! guard, and the booking writer into the [`BookingStore`] contract: one
//! transaction per reservation, exactly one commit or rollback, connection
//! always released. [`PostgresUserDirectory`] serves the pre-transaction
//! user check from the same database.

use boxoffice_core::{
    Booking, BookingError, BookingStore, EventId, EventInventory, Result, StoreFuture,
    TicketQuantity, User, UserDirectory, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::guard;
use crate::transaction::{TransactionCoordinator, TransactionOptions};
use crate::writer;

/// Postgres-backed implementation of [`BookingStore`].
///
/// # Example
///
/// ```no_run
/// use boxoffice_postgres::{PostgresBookingStore, PostgresConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PostgresConfig::from_env();
/// let store = PostgresBookingStore::connect(&config).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
    coordinator: TransactionCoordinator,
}

impl PostgresBookingStore {
    /// Connects a pool per the configuration and builds the store.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DatabaseError`] when the pool cannot reach
    /// the database within the configured acquire timeout.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| {
                BookingError::DatabaseError(format!("Failed to connect to Postgres: {e}"))
            })?;

        Ok(Self::from_pool(pool, config.transaction_options()))
    }

    /// Builds the store over an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool, options: TransactionOptions) -> Self {
        Self {
            coordinator: TransactionCoordinator::new(pool.clone(), options),
            pool,
        }
    }

    /// Runs the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::DatabaseError`] when a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Failed to run migrations: {e}")))
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The transaction coordinator this store reserves through.
    #[must_use]
    pub const fn coordinator(&self) -> &TransactionCoordinator {
        &self.coordinator
    }

    /// One reservation transaction: begin, lock and check, write, then
    /// commit on success or roll back on any failure.
    async fn reserve_in_transaction(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
    ) -> Result<Booking> {
        let mut tx = self.coordinator.begin().await?;

        let outcome = async {
            let locked = guard::lock_and_check(&mut *tx, event_id, quantity).await?;
            writer::write_booking(&mut *tx, locked, user_id, quantity).await
        }
        .await;

        match outcome {
            Ok(booking) => self.coordinator.commit(tx).await.map(|()| booking),
            Err(err) => {
                self.coordinator.rollback(tx).await;
                Err(err)
            }
        }
    }
}

impl BookingStore for PostgresBookingStore {
    fn reserve_tickets(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
    ) -> StoreFuture<'_, Booking> {
        Box::pin(async move {
            let result = self.reserve_in_transaction(user_id, event_id, quantity).await;

            match &result {
                Ok(booking) => {
                    tracing::debug!(
                        booking_id = %booking.id,
                        event_id = %event_id,
                        quantity = %quantity,
                        "reservation committed"
                    );
                    metrics::counter!("bookings.created").increment(1);
                }
                Err(err) => {
                    metrics::counter!("bookings.failed", "kind" => err.kind()).increment(1);
                }
            }

            result
        })
    }

    fn fetch_inventory(&self, event_id: EventId) -> StoreFuture<'_, EventInventory> {
        Box::pin(async move {
            let row: Option<(i32, i32)> = sqlx::query_as(
                r"
                SELECT total_tickets, available_tickets
                FROM events
                WHERE id = $1
                ",
            )
            .bind(*event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Failed to read inventory: {e}")))?;

            let Some((total, available)) = row else {
                return Err(BookingError::EventNotFound(event_id));
            };

            Ok(EventInventory::with_available(
                event_id,
                guard::count_u32(total, "total_tickets")?,
                guard::count_u32(available, "available_tickets")?,
            ))
        })
    }
}

/// Postgres-backed implementation of [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

impl PostgresUserDirectory {
    /// Creates a directory over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserDirectory for PostgresUserDirectory {
    fn find_user(&self, id: UserId) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as(
                r"
                SELECT id, email, username, created_at
                FROM users
                WHERE id = $1
                ",
            )
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Failed to look up user: {e}")))?;

            row.map(User::from).ok_or(BookingError::UserNotFound(id))
        })
    }
}
