//! Sample records for booking tests.

use boxoffice_core::{EventId, EventInventory, User, UserId};
use chrono::Utc;

/// A user with a fresh id, named after `username`.
#[must_use]
pub fn user_named(username: &str) -> User {
    User {
        id: UserId::new(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        created_at: Utc::now(),
    }
}

/// An event with a fresh id and all `total_tickets` still available.
#[must_use]
pub fn open_event(total_tickets: u32) -> EventInventory {
    EventInventory::new(EventId::new(), total_tickets)
}

/// An event with a fresh id, partially sold down to `available_tickets`.
#[must_use]
pub fn partially_sold_event(total_tickets: u32, available_tickets: u32) -> EventInventory {
    EventInventory::with_available(EventId::new(), total_tickets, available_tickets)
}
