//! Error types for booking operations.

use thiserror::Error;

use crate::types::{EventId, UserId};

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the booking pipeline.
///
/// The first group are expected business outcomes: they are propagated to the
/// caller verbatim and are never retried automatically. The second group are
/// infrastructure faults, surfaced only after the enclosing transaction has
/// rolled back and its connection has been released, so the caller may safely
/// retry the whole operation (a retried booking is a new booking; there is no
/// deduplication key).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Business Outcomes
    // ═══════════════════════════════════════════════════════════

    /// The referencing user does not exist.
    #[error("User with ID {0} not found")]
    UserNotFound(UserId),

    /// No inventory row exists for the requested event.
    #[error("Event with ID {0} not found")]
    EventNotFound(EventId),

    /// Remaining capacity does not cover the requested quantity.
    ///
    /// Carries both counts for caller-facing diagnostics; the available count
    /// is the value read under the row lock, so it is exact at rejection time.
    #[error("Not enough tickets available. Requested: {requested}, Available: {available}")]
    InsufficientCapacity {
        /// Tickets the caller asked for
        requested: u32,
        /// Tickets actually available when the lock was held
        available: u32,
    },

    /// Requested quantity outside the bookable range.
    #[error("Invalid number of tickets: {requested} (must be between 1 and 10)")]
    InvalidQuantity {
        /// The rejected quantity
        requested: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure
    // ═══════════════════════════════════════════════════════════

    /// The inventory row lock was not acquired within the configured bound.
    ///
    /// Only produced when a lock timeout is configured; the default is to
    /// wait for the current holder to finish.
    #[error("Timed out waiting for the inventory lock on event {0}")]
    InventoryBusy(EventId),

    /// Storage-layer fault (connection loss, deadlock, serialization
    /// failure, corrupt row). The transaction is already rolled back when
    /// this surfaces.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl BookingError {
    /// Returns `true` if this error is an expected business outcome caused
    /// by the request itself rather than by infrastructure.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::BookingError;
    /// assert!(BookingError::InvalidQuantity { requested: 11 }.is_client_error());
    /// assert!(!BookingError::DatabaseError("connection reset".into()).is_client_error());
    /// ```
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::EventNotFound(_)
                | Self::InsufficientCapacity { .. }
                | Self::InvalidQuantity { .. }
        )
    }

    /// Returns `true` if retrying the whole operation may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use boxoffice_core::BookingError;
    /// assert!(BookingError::DatabaseError("deadlock detected".into()).is_retryable());
    /// assert!(!BookingError::InsufficientCapacity { requested: 5, available: 3 }.is_retryable());
    /// ```
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InventoryBusy(_) | Self::DatabaseError(_))
    }

    /// Stable label for this error kind, for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "user_not_found",
            Self::EventNotFound(_) => "event_not_found",
            Self::InsufficientCapacity { .. } => "insufficient_capacity",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InventoryBusy(_) => "inventory_busy",
            Self::DatabaseError(_) => "database_error",
        }
    }
}
