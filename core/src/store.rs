//! Storage abstractions the booking workflow is built against.
//!
//! Two narrow traits: [`BookingStore`] for the transactional reservation unit
//! and the committed inventory read, [`UserDirectory`] for the user existence
//! check that runs before the transaction opens. The workflow only sees these
//! traits, so the same orchestration runs against Postgres in production and
//! the in-memory store in tests.

use std::future::Future;
use std::pin::Pin;

use crate::error::BookingError;
use crate::types::{Booking, EventId, EventInventory, TicketQuantity, User, UserId};

/// Boxed future alias used by the store traits.
///
/// The traits return explicit `Pin<Box<dyn Future>>` instead of `async fn` so
/// they stay dyn-compatible (`Arc<dyn BookingStore>`) and their futures are
/// guaranteed `Send` for use across task boundaries.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BookingError>> + Send + 'a>>;

/// Transactional persistence boundary for event inventory and bookings.
///
/// # Contract
///
/// `reserve_tickets` is the whole lock → check → write → commit unit:
///
/// 1. Open a transaction.
/// 2. Read the event's inventory row under an exclusive lock, blocking any
///    concurrent reservation for the same event until this one resolves.
/// 3. Validate that availability covers the request.
/// 4. Persist the decrement and the booking record in that same transaction.
/// 5. Commit, or roll back on any failure.
///
/// Exactly one commit or rollback happens per call, the underlying
/// connection is released on every path, and nothing is observable outside
/// the transaction until commit. Two concurrent calls for the same event can
/// never both read the same availability: the second lock acquirer sees the
/// first's committed decrement.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the workflow is invoked from many
/// tasks in parallel against the same store.
///
/// # Implementations
///
/// - **`PostgresBookingStore`** (production): row lock via `SELECT ... FOR UPDATE`
/// - **`InMemoryBookingStore`** (testing): per-event async mutex
pub trait BookingStore: Send + Sync {
    /// Atomically reserve `quantity` tickets of `event_id` for `user_id`.
    ///
    /// The quantity is already range-validated by construction of
    /// [`TicketQuantity`]; this method does not re-validate it.
    ///
    /// # Returns
    ///
    /// The committed [`Booking`]. Its existence implies the inventory
    /// decrement is durable.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`]: no inventory row for `event_id`;
    ///   nothing was written.
    /// - [`BookingError::InsufficientCapacity`]: availability under the lock
    ///   was below `quantity`; nothing was written.
    /// - [`BookingError::UserNotFound`]: the user vanished between the
    ///   workflow's pre-check and the write (foreign key enforcement).
    /// - [`BookingError::InventoryBusy`]: the row lock was not acquired
    ///   within the configured bound.
    /// - [`BookingError::DatabaseError`]: storage fault; the transaction is
    ///   rolled back before this surfaces.
    fn reserve_tickets(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
    ) -> StoreFuture<'_, Booking>;

    /// Read an event's committed inventory counts.
    ///
    /// A plain read outside any reservation transaction; it never blocks on
    /// the row lock and may be served from a replica in other deployments.
    /// Intended for query surfaces and test assertions, not for availability
    /// decisions (those happen under the lock in `reserve_tickets`).
    ///
    /// # Errors
    ///
    /// - [`BookingError::EventNotFound`]: no inventory row for `event_id`.
    /// - [`BookingError::DatabaseError`]: storage fault.
    fn fetch_inventory(&self, event_id: EventId) -> StoreFuture<'_, EventInventory>;
}

/// User existence lookups for the pre-transaction verification step.
///
/// Served outside the reservation transaction's isolation scope; a user who
/// disappears after this check is still caught by the store's foreign key
/// mapping in [`BookingStore::reserve_tickets`].
pub trait UserDirectory: Send + Sync {
    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// - [`BookingError::UserNotFound`]: no such user.
    /// - [`BookingError::DatabaseError`]: storage fault.
    fn find_user(&self, id: UserId) -> StoreFuture<'_, User>;
}
