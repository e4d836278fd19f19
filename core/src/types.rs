//! Domain types for the Boxoffice booking core.
//!
//! This module contains the value objects and records the booking workflow
//! operates on: identifiers, the validated ticket quantity, the per-event
//! inventory row, and the immutable booking record. The capacity arithmetic
//! lives here (`EventInventory::has_availability` / `checked_reserve`) so
//! every store backend shares one definition of the availability invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::BookingError;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ticket Quantity (validated value object)
// ============================================================================

/// Number of tickets in a single booking, validated to `1..=10`.
///
/// Constructing a `TicketQuantity` is the only way to get a quantity into the
/// booking pipeline, so out-of-range requests are rejected before any lock or
/// transaction is touched. Deserialization goes through the same validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16")]
pub struct TicketQuantity(u16);

impl TicketQuantity {
    /// Smallest bookable quantity
    pub const MIN: u16 = 1;
    /// Largest bookable quantity per booking
    pub const MAX: u16 = 10;

    /// Validates and wraps a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidQuantity`] when `quantity` is outside
    /// `1..=10`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use boxoffice_core::types::TicketQuantity;
    ///
    /// assert!(TicketQuantity::new(1).is_ok());
    /// assert!(TicketQuantity::new(10).is_ok());
    /// assert!(TicketQuantity::new(0).is_err());
    /// assert!(TicketQuantity::new(11).is_err());
    /// ```
    pub const fn new(quantity: u16) -> Result<Self, BookingError> {
        if quantity >= Self::MIN && quantity <= Self::MAX {
            Ok(Self(quantity))
        } else {
            Err(BookingError::InvalidQuantity {
                requested: quantity as u32,
            })
        }
    }

    /// Returns the raw quantity
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Returns the quantity widened for capacity arithmetic
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u16> for TicketQuantity {
    type Error = BookingError;

    fn try_from(quantity: u16) -> Result<Self, Self::Error> {
        Self::new(quantity)
    }
}

impl fmt::Display for TicketQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Inventory
// ============================================================================

/// Per-event inventory row: total capacity and tickets still available.
///
/// Invariant: `0 <= available_tickets <= total_tickets` at all times.
/// `total_tickets` is immutable after creation; `available_tickets` is only
/// mutated by the booking pipeline while the row's exclusive lock is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    /// The event this inventory belongs to
    pub event_id: EventId,
    /// Capacity fixed at event creation
    pub total_tickets: u32,
    /// Tickets not yet sold
    pub available_tickets: u32,
}

impl EventInventory {
    /// Creates a fresh inventory with all tickets available
    #[must_use]
    pub const fn new(event_id: EventId, total_tickets: u32) -> Self {
        Self {
            event_id,
            total_tickets,
            available_tickets: total_tickets,
        }
    }

    /// Creates an inventory at a specific availability (partially sold)
    #[must_use]
    pub const fn with_available(
        event_id: EventId,
        total_tickets: u32,
        available_tickets: u32,
    ) -> Self {
        Self {
            event_id,
            total_tickets,
            available_tickets,
        }
    }

    /// Number of tickets sold so far
    #[must_use]
    pub const fn tickets_sold(&self) -> u32 {
        self.total_tickets.saturating_sub(self.available_tickets)
    }

    /// Whether the remaining capacity covers `quantity`
    #[must_use]
    pub const fn has_availability(&self, quantity: TicketQuantity) -> bool {
        self.available_tickets >= quantity.as_u32()
    }

    /// Returns the inventory after reserving `quantity` tickets, or `None`
    /// when availability does not cover the request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use boxoffice_core::types::{EventId, EventInventory, TicketQuantity};
    ///
    /// let inventory = EventInventory::new(EventId::new(), 10);
    /// let seven = TicketQuantity::new(7)?;
    /// let five = TicketQuantity::new(5)?;
    ///
    /// let after = inventory.checked_reserve(seven).unwrap();
    /// assert_eq!(after.available_tickets, 3);
    /// assert!(after.checked_reserve(five).is_none());
    /// # Ok::<(), boxoffice_core::BookingError>(())
    /// ```
    #[must_use]
    pub const fn checked_reserve(&self, quantity: TicketQuantity) -> Option<Self> {
        if self.has_availability(quantity) {
            Some(Self {
                event_id: self.event_id,
                total_tickets: self.total_tickets,
                available_tickets: self.available_tickets - quantity.as_u32(),
            })
        } else {
            None
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// An immutable booking record.
///
/// A booking's existence is proof that the corresponding inventory decrement
/// committed; the two are written in the same transaction and there are no
/// partial bookings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier
    pub id: BookingId,
    /// The user the tickets were booked for
    pub user_id: UserId,
    /// The event the tickets belong to
    pub event_id: EventId,
    /// How many tickets this booking reserved
    pub number_of_tickets: TicketQuantity,
    /// When the booking was committed
    pub created_at: DateTime<Utc>,
}

/// A user as seen by the booking workflow.
///
/// Only the fields the workflow needs for existence checks and diagnostics;
/// credentials stay in the users table and are never loaded here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,
    /// Unique email address
    pub email: String,
    /// Display name
    pub username: String,
    /// When the user was created
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn qty(n: u16) -> TicketQuantity {
        TicketQuantity::new(n).unwrap()
    }

    #[test]
    fn quantity_accepts_full_range() {
        for n in TicketQuantity::MIN..=TicketQuantity::MAX {
            assert_eq!(TicketQuantity::new(n).unwrap().get(), n);
        }
    }

    #[test]
    fn quantity_rejects_zero_and_eleven() {
        assert!(matches!(
            TicketQuantity::new(0),
            Err(BookingError::InvalidQuantity { requested: 0 })
        ));
        assert!(matches!(
            TicketQuantity::new(11),
            Err(BookingError::InvalidQuantity { requested: 11 })
        ));
    }

    #[test]
    fn quantity_deserialization_validates() {
        let ok: TicketQuantity = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);

        assert!(serde_json::from_str::<TicketQuantity>("0").is_err());
        assert!(serde_json::from_str::<TicketQuantity>("11").is_err());
    }

    #[test]
    fn quantity_serializes_as_raw_number() {
        let json = serde_json::to_string(&qty(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn fresh_inventory_is_fully_available() {
        let inventory = EventInventory::new(EventId::new(), 100);
        assert_eq!(inventory.available_tickets, 100);
        assert_eq!(inventory.tickets_sold(), 0);
    }

    #[test]
    fn checked_reserve_decrements_exactly() {
        let inventory = EventInventory::new(EventId::new(), 10);
        let after = inventory.checked_reserve(qty(7)).unwrap();
        assert_eq!(after.available_tickets, 3);
        assert_eq!(after.total_tickets, 10);
        assert_eq!(after.tickets_sold(), 7);
    }

    #[test]
    fn checked_reserve_refuses_overdraw() {
        let inventory = EventInventory::with_available(EventId::new(), 10, 3);
        assert!(inventory.checked_reserve(qty(5)).is_none());
        // The original value is untouched; reservations are pure transitions.
        assert_eq!(inventory.available_tickets, 3);
    }

    #[test]
    fn last_ticket_can_be_reserved() {
        let inventory = EventInventory::with_available(EventId::new(), 10, 1);
        let after = inventory.checked_reserve(qty(1)).unwrap();
        assert_eq!(after.available_tickets, 0);
        assert!(!after.has_availability(qty(1)));
    }

    proptest! {
        /// Applying any sequence of reservations never drives availability
        /// below zero or above total, and sold + available always equals
        /// total.
        #[test]
        fn reservation_sequences_preserve_inventory_bounds(
            total in 0u32..500,
            quantities in prop::collection::vec(1u16..=10, 0..64),
        ) {
            let mut inventory = EventInventory::new(EventId::new(), total);

            for n in quantities {
                let quantity = TicketQuantity::new(n).unwrap();
                match inventory.checked_reserve(quantity) {
                    Some(after) => inventory = after,
                    None => prop_assert!(inventory.available_tickets < quantity.as_u32()),
                }

                prop_assert!(inventory.available_tickets <= inventory.total_tickets);
                prop_assert_eq!(
                    inventory.tickets_sold() + inventory.available_tickets,
                    inventory.total_tickets
                );
            }
        }

        #[test]
        fn quantity_construction_matches_range(n in 0u16..200) {
            let result = TicketQuantity::new(n);
            if (TicketQuantity::MIN..=TicketQuantity::MAX).contains(&n) {
                prop_assert_eq!(result.unwrap().get(), n);
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
