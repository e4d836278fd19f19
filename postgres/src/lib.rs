//! `PostgreSQL` persistence for the Boxoffice booking workflow.
//!
//! This crate provides the production implementations of the `BookingStore`
//! and `UserDirectory` traits from `boxoffice-core`. The reservation path is
//! built from three pieces, each its own module:
//!
//! - [`transaction`]: begin/commit/rollback with configurable isolation and
//!   an optional bounded lock wait
//! - [`guard`]: `SELECT ... FOR UPDATE` row lock plus availability check
//! - [`writer`]: inventory decrement plus booking insert, same transaction
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_core::BookingWorkflow;
//! use boxoffice_postgres::{PostgresBookingStore, PostgresConfig, PostgresUserDirectory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PostgresConfig::from_env();
//!     let store = PostgresBookingStore::connect(&config).await?;
//!     store.migrate().await?;
//!
//!     let users = PostgresUserDirectory::new(store.pool().clone());
//!     let workflow = BookingWorkflow::new(store, users);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod guard;
pub mod store;
pub mod transaction;
pub mod writer;

pub use config::PostgresConfig;
pub use store::{PostgresBookingStore, PostgresUserDirectory};
pub use transaction::{IsolationLevel, TransactionCoordinator, TransactionOptions};
