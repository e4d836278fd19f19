//! # Boxoffice Core
//!
//! Domain types, storage traits, and the booking workflow for the Boxoffice
//! ticketing system.
//!
//! The one piece of real engineering risk in this system is the
//! ticket-inventory booking path: many callers race to book the same event,
//! and the number of tickets sold must never exceed capacity. Everything in
//! this crate exists to make that path correct and testable:
//!
//! ```text
//! BookingWorkflow::create_booking
//!         │
//!         ├─ validate quantity (1..=10), before any lock
//!         ├─ UserDirectory::find_user          (outside the transaction)
//!         └─ BookingStore::reserve_tickets     (one transaction)
//!                 ├─ lock inventory row         exclusive, per event
//!                 ├─ check availability         under the lock
//!                 ├─ decrement + insert booking same transaction
//!                 └─ commit (or rollback on any failure)
//! ```
//!
//! ## Crates
//!
//! - `boxoffice-core` (this crate): types, errors, traits, orchestration.
//!   No storage dependency.
//! - `boxoffice-postgres`: the production store; row locks via
//!   `SELECT ... FOR UPDATE`.
//! - `boxoffice-testing`: deterministic in-memory store for tests.
//!
//! ## Guarantees
//!
//! - `0 <= available_tickets <= total_tickets` after every commit.
//! - A booking record exists if and only if its inventory decrement
//!   committed, in the same transaction.
//! - Two concurrent reservations for one event serialize on that event's
//!   row lock; the second acquirer always sees the first's committed
//!   decrement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::{BookingError, Result};
pub use store::{BookingStore, StoreFuture, UserDirectory};
pub use types::{Booking, BookingId, EventId, EventInventory, TicketQuantity, User, UserId};
pub use workflow::BookingWorkflow;
