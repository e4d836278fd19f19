//! The booking workflow: composes user verification and the transactional
//! reservation into the public create-booking operation.
//!
//! A booking attempt moves through a fixed sequence of states:
//!
//! ```text
//! Started → UserVerified → InventoryLocked → InventoryChecked → Written → Committed
//!                \              \                 \                \
//!                 └──────────────┴─────────────────┴────────────────┴──→ Failed
//! ```
//!
//! `Started → UserVerified` happens here, outside any transaction. The rest
//! (`InventoryLocked → Committed`) is the store's transactional unit,
//! [`BookingStore::reserve_tickets`]; any failure inside it rolls back before
//! the error reaches this layer, so a `Failed` outcome never leaves partial
//! state behind.

use tracing::{info, warn};

use crate::error::Result;
use crate::store::{BookingStore, UserDirectory};
use crate::types::{Booking, EventId, TicketQuantity, UserId};

/// Orchestrator for the create-booking operation.
///
/// Generic over the persistence boundary and the user directory so the same
/// orchestration runs against Postgres in production and the in-memory store
/// in tests.
#[derive(Debug, Clone)]
pub struct BookingWorkflow<S, U> {
    store: S,
    users: U,
}

impl<S, U> BookingWorkflow<S, U>
where
    S: BookingStore,
    U: UserDirectory,
{
    /// Creates a workflow over the given store and user directory.
    pub const fn new(store: S, users: U) -> Self {
        Self { store, users }
    }

    /// Books `number_of_tickets` of `event_id` for `user_id`.
    ///
    /// The caller-facing boundary is expected to have validated the quantity
    /// already; it is re-checked here regardless, before any collaborator is
    /// touched, so an out-of-range value can never reach a lock. The user
    /// check runs outside the transaction; the event lock, availability
    /// check, and writes are one atomic unit inside it.
    ///
    /// There is no idempotency key: a client retry after a network timeout
    /// books again. Callers that need exactly-once must deduplicate
    /// themselves.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidQuantity`](crate::BookingError::InvalidQuantity):
    ///   quantity outside `1..=10`; nothing else ran.
    /// - [`BookingError::UserNotFound`](crate::BookingError::UserNotFound):
    ///   unknown user; no transaction was opened.
    /// - [`BookingError::EventNotFound`](crate::BookingError::EventNotFound):
    ///   unknown event; nothing was written.
    /// - [`BookingError::InsufficientCapacity`](crate::BookingError::InsufficientCapacity):
    ///   availability under the lock was below the request; nothing was
    ///   written.
    /// - [`BookingError::InventoryBusy`](crate::BookingError::InventoryBusy) /
    ///   [`BookingError::DatabaseError`](crate::BookingError::DatabaseError):
    ///   infrastructure faults, surfaced after rollback and release.
    pub async fn create_booking(
        &self,
        user_id: UserId,
        event_id: EventId,
        number_of_tickets: u16,
    ) -> Result<Booking> {
        let result = self.verify_and_reserve(user_id, event_id, number_of_tickets).await;

        match &result {
            Ok(booking) => info!(
                booking_id = %booking.id,
                user_id = %user_id,
                event_id = %event_id,
                quantity = %booking.number_of_tickets,
                "booking created"
            ),
            Err(err) => warn!(
                user_id = %user_id,
                event_id = %event_id,
                quantity = number_of_tickets,
                error = %err,
                error_kind = err.kind(),
                "failed to create booking"
            ),
        }

        result
    }

    async fn verify_and_reserve(
        &self,
        user_id: UserId,
        event_id: EventId,
        number_of_tickets: u16,
    ) -> Result<Booking> {
        let quantity = TicketQuantity::new(number_of_tickets)?;

        self.users.find_user(user_id).await?;

        self.store.reserve_tickets(user_id, event_id, quantity).await
    }
}
