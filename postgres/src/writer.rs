//! Booking writer: persists the capacity decrement and the booking record
//! as one unit.
//!
//! Runs strictly after the guard, on the same connection, inside the same
//! transaction. It performs no availability validation of its own; the guard
//! already verified the locked counts cover the request. Neither write is
//! visible to other transactions until the coordinator commits.

use boxoffice_core::{
    Booking, BookingError, BookingId, EventInventory, Result, TicketQuantity, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

/// Writes the inventory decrement and the booking row.
///
/// `locked` must be the inventory returned by the guard in this same
/// transaction, with availability already verified. The booking id is
/// generated here; `created_at` comes back from the database so the record
/// matches what was committed.
///
/// # Errors
///
/// - [`BookingError::UserNotFound`]: the user row vanished between the
///   workflow's pre-check and this insert (foreign key violation).
/// - [`BookingError::DatabaseError`]: any other storage fault, including a
///   violated inventory check constraint. The caller rolls back in every
///   error case.
pub async fn write_booking(
    conn: &mut PgConnection,
    locked: EventInventory,
    user_id: UserId,
    quantity: TicketQuantity,
) -> Result<Booking> {
    debug_assert!(
        locked.has_availability(quantity),
        "guard must verify availability before the writer runs"
    );
    let remaining = i32::try_from(locked.available_tickets - quantity.as_u32()).map_err(|_| {
        BookingError::DatabaseError(format!(
            "Remaining count {} exceeds i32::MAX",
            locked.available_tickets
        ))
    })?;

    let updated = sqlx::query(
        r"
        UPDATE events
        SET available_tickets = $2, updated_at = now()
        WHERE id = $1
        ",
    )
    .bind(*locked.event_id.as_uuid())
    .bind(remaining)
    .execute(&mut *conn)
    .await
    .map_err(|e| BookingError::DatabaseError(format!("Failed to decrement inventory: {e}")))?;

    // The row is locked by this transaction, so it cannot have been deleted.
    if updated.rows_affected() == 0 {
        return Err(BookingError::DatabaseError(format!(
            "Inventory row for event {} disappeared while locked",
            locked.event_id
        )));
    }

    let booking_id = BookingId::new();
    let (created_at,): (DateTime<Utc>,) = sqlx::query_as(
        r"
        INSERT INTO bookings (id, user_id, event_id, number_of_tickets)
        VALUES ($1, $2, $3, $4)
        RETURNING created_at
        ",
    )
    .bind(*booking_id.as_uuid())
    .bind(*user_id.as_uuid())
    .bind(*locked.event_id.as_uuid())
    .bind(i32::from(quantity.get()))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| insert_error(user_id, &e))?;

    Ok(Booking {
        id: booking_id,
        user_id,
        event_id: locked.event_id,
        number_of_tickets: quantity,
        created_at,
    })
}

fn insert_error(user_id: UserId, e: &sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db) = e {
        if db.is_foreign_key_violation() && db.constraint() == Some("fk_bookings_user") {
            return BookingError::UserNotFound(user_id);
        }
    }
    BookingError::DatabaseError(format!("Failed to insert booking: {e}"))
}
