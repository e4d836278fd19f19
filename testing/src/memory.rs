//! Deterministic in-memory implementation of the booking store traits.
//!
//! The database row lock is modeled by one `tokio::sync::Mutex` per event:
//! all reservations for an event serialize on it, reservations for
//! different events proceed independently, and a holder blocks competitors
//! exactly like a `FOR UPDATE` holder does. An in-process lock only
//! substitutes for the database lock when every writer shares the process,
//! which holds in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use boxoffice_core::{
    Booking, BookingError, BookingId, BookingStore, EventId, EventInventory, Result, StoreFuture,
    TicketQuantity, User, UserDirectory, UserId,
};
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

/// In-memory booking store and user directory for tests.
///
/// Implements the same contracts as the Postgres store, including the
/// atomicity of decrement-plus-insert: a reservation either applies both or
/// neither, and a fault injected between the availability check and the
/// write leaves the tables untouched.
///
/// Cloning shares the underlying tables, so a cloned store hands the same
/// state to concurrent tasks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    users: Mutex<HashMap<UserId, User>>,
    events: Mutex<HashMap<EventId, EventInventory>>,
    bookings: Mutex<Vec<Booking>>,
    event_locks: Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>,
    lock_timeout: Option<Duration>,
    fail_next_write: AtomicBool,
}

/// Locks a table mutex, continuing past poisoning from panicked test tasks.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBookingStore {
    /// Creates an empty store that waits indefinitely for event locks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose reservations give up with
    /// [`BookingError::InventoryBusy`] when an event lock is not acquired
    /// within `timeout`.
    #[must_use]
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                lock_timeout: Some(timeout),
                ..Inner::default()
            }),
        }
    }

    /// Inserts a user into the directory.
    pub fn insert_user(&self, user: User) {
        lock(&self.inner.users).insert(user.id, user);
    }

    /// Inserts an event's inventory row.
    pub fn insert_event(&self, inventory: EventInventory) {
        lock(&self.inner.events).insert(inventory.event_id, inventory);
    }

    /// All committed bookings for an event, in commit order.
    #[must_use]
    pub fn bookings_for_event(&self, event_id: EventId) -> Vec<Booking> {
        lock(&self.inner.bookings)
            .iter()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Makes the next reservation fail at the write step, after its
    /// availability check passed. The inventory must come through unchanged.
    pub fn fail_next_write(&self) {
        self.inner.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Acquires and holds the event's reservation lock, like a stuck
    /// transaction holder would. Reservations for this event block (or time
    /// out) until the returned guard is dropped.
    pub async fn hold_event_lock(&self, event_id: EventId) -> OwnedMutexGuard<()> {
        self.event_lock(event_id).lock_owned().await
    }

    fn event_lock(&self, event_id: EventId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = lock(&self.inner.event_locks);
        Arc::clone(locks.entry(event_id).or_default())
    }

    /// The whole transactional body, entered only while the event lock is
    /// held. Every fallible step runs before the first mutation, so a
    /// failure leaves both tables untouched.
    fn apply_reservation(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
    ) -> Result<Booking> {
        let mut events = lock(&self.inner.events);
        let inventory = events
            .get(&event_id)
            .copied()
            .ok_or(BookingError::EventNotFound(event_id))?;

        let updated =
            inventory
                .checked_reserve(quantity)
                .ok_or(BookingError::InsufficientCapacity {
                    requested: quantity.as_u32(),
                    available: inventory.available_tickets,
                })?;

        // Foreign-key equivalent of fk_bookings_user.
        if !lock(&self.inner.users).contains_key(&user_id) {
            return Err(BookingError::UserNotFound(user_id));
        }

        if self.inner.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(BookingError::DatabaseError(
                "injected write failure".to_string(),
            ));
        }

        let booking = Booking {
            id: BookingId::new(),
            user_id,
            event_id,
            number_of_tickets: quantity,
            created_at: Utc::now(),
        };

        events.insert(event_id, updated);
        lock(&self.inner.bookings).push(booking.clone());

        Ok(booking)
    }
}

impl BookingStore for InMemoryBookingStore {
    fn reserve_tickets(
        &self,
        user_id: UserId,
        event_id: EventId,
        quantity: TicketQuantity,
    ) -> StoreFuture<'_, Booking> {
        Box::pin(async move {
            let event_lock = self.event_lock(event_id);

            let _guard = match self.inner.lock_timeout {
                None => event_lock.lock_owned().await,
                Some(bound) => tokio::time::timeout(bound, event_lock.lock_owned())
                    .await
                    .map_err(|_| BookingError::InventoryBusy(event_id))?,
            };

            self.apply_reservation(user_id, event_id, quantity)
        })
    }

    fn fetch_inventory(&self, event_id: EventId) -> StoreFuture<'_, EventInventory> {
        Box::pin(async move {
            lock(&self.inner.events)
                .get(&event_id)
                .copied()
                .ok_or(BookingError::EventNotFound(event_id))
        })
    }
}

impl UserDirectory for InMemoryBookingStore {
    fn find_user(&self, id: UserId) -> StoreFuture<'_, User> {
        Box::pin(async move {
            lock(&self.inner.users)
                .get(&id)
                .cloned()
                .ok_or(BookingError::UserNotFound(id))
        })
    }
}
