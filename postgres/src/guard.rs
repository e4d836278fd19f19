//! Inventory guard: exclusive row lock plus availability check.
//!
//! `SELECT ... FOR UPDATE` is what prevents the classic lost-update race:
//! without it, two transactions can both read `available_tickets = 1`, both
//! conclude the last ticket is theirs, and both decrement. With the lock, the
//! second reader blocks until the first transaction resolves and then sees
//! the committed counts. The lock is per event row, so bookings for
//! different events never contend with each other.

use boxoffice_core::{BookingError, EventId, EventInventory, Result, TicketQuantity};
use sqlx::PgConnection;

/// SQLSTATE raised when `lock_timeout` expires while waiting for a row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Locks the event's inventory row and checks availability.
///
/// Must be called inside an open transaction; the acquired lock is held
/// until that transaction commits or rolls back. On success the locked row's
/// counts are returned for the writer to decrement.
///
/// # Errors
///
/// - [`BookingError::EventNotFound`]: no inventory row for `event_id`.
/// - [`BookingError::InsufficientCapacity`]: the locked row's availability
///   is below `quantity`; carries both counts.
/// - [`BookingError::InventoryBusy`]: a configured `lock_timeout` expired
///   while waiting for the current holder.
/// - [`BookingError::DatabaseError`]: any other storage fault, or counts
///   outside the representable range.
pub async fn lock_and_check(
    conn: &mut PgConnection,
    event_id: EventId,
    quantity: TicketQuantity,
) -> Result<EventInventory> {
    let row: Option<(i32, i32)> = sqlx::query_as(
        r"
        SELECT total_tickets, available_tickets
        FROM events
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(*event_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| lock_error(event_id, &e))?;

    let Some((total, available)) = row else {
        return Err(BookingError::EventNotFound(event_id));
    };

    let inventory = EventInventory::with_available(
        event_id,
        count_u32(total, "total_tickets")?,
        count_u32(available, "available_tickets")?,
    );

    if !inventory.has_availability(quantity) {
        return Err(BookingError::InsufficientCapacity {
            requested: quantity.as_u32(),
            available: inventory.available_tickets,
        });
    }

    Ok(inventory)
}

/// Converts a stored ticket count to the domain representation.
///
/// The schema's check constraints keep counts non-negative, so a negative
/// value here means the row was corrupted outside the booking pipeline.
pub(crate) fn count_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        BookingError::DatabaseError(format!("Column {column} holds negative count {value}"))
    })
}

fn lock_error(event_id: EventId, e: &sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db) = e {
        if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
            return BookingError::InventoryBusy(event_id);
        }
    }
    BookingError::DatabaseError(format!("Failed to lock inventory row: {e}"))
}
