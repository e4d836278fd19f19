//! # Boxoffice Testing
//!
//! Deterministic test doubles for the Boxoffice booking workflow.
//!
//! This crate provides:
//! - [`InMemoryBookingStore`]: in-memory `BookingStore` + `UserDirectory`
//!   with per-event locking, an optional lock-wait bound, and write fault
//!   injection
//! - [`fixtures`]: sample users and events
//!
//! ## Example
//!
//! ```
//! use boxoffice_core::BookingWorkflow;
//! use boxoffice_testing::{fixtures, InMemoryBookingStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryBookingStore::new();
//! let user = fixtures::user_named("ada");
//! let event = fixtures::open_event(10);
//! store.insert_user(user.clone());
//! store.insert_event(event);
//!
//! let workflow = BookingWorkflow::new(store.clone(), store.clone());
//! let booking = workflow
//!     .create_booking(user.id, event.event_id, 2)
//!     .await
//!     .expect("booking succeeds");
//! assert_eq!(booking.number_of_tickets.get(), 2);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod memory;

pub use memory::InMemoryBookingStore;
