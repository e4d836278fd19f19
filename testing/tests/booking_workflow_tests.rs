//! Tests for the booking workflow against the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use std::sync::Arc;
use std::time::Duration;

use boxoffice_core::{
    BookingError, BookingStore, BookingWorkflow, EventId, EventInventory, UserDirectory, UserId,
};
use boxoffice_testing::fixtures::{open_event, partially_sold_event, user_named};
use boxoffice_testing::InMemoryBookingStore;
use futures::future::join_all;
use tokio::sync::Barrier;

type Workflow = BookingWorkflow<InMemoryBookingStore, InMemoryBookingStore>;

/// Store and workflow seeded with one user and the given event.
fn setup_workflow(inventory: EventInventory) -> (InMemoryBookingStore, Workflow, UserId, EventId) {
    let store = InMemoryBookingStore::new();
    let user = user_named("alice");
    let user_id = user.id;
    let event_id = inventory.event_id;
    store.insert_user(user);
    store.insert_event(inventory);
    let workflow = BookingWorkflow::new(store.clone(), store.clone());
    (store, workflow, user_id, event_id)
}

#[tokio::test]
async fn test_booking_decrements_inventory_and_records_booking() {
    let (store, workflow, user_id, event_id) = setup_workflow(open_event(10));

    let booking = workflow
        .create_booking(user_id, event_id, 3)
        .await
        .expect("Booking should succeed with 10 tickets available");

    assert_eq!(booking.user_id, user_id);
    assert_eq!(booking.event_id, event_id);
    assert_eq!(booking.number_of_tickets.get(), 3);

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.total_tickets, 10);
    assert_eq!(inventory.available_tickets, 7);

    let bookings = store.bookings_for_event(event_id);
    assert_eq!(bookings.len(), 1, "Exactly one booking should be recorded");
    assert_eq!(bookings[0].id, booking.id);
}

#[tokio::test]
async fn test_insufficient_capacity_reports_remaining_availability() {
    let (store, workflow, user_id, event_id) = setup_workflow(open_event(10));

    workflow
        .create_booking(user_id, event_id, 7)
        .await
        .expect("First booking of 7 should succeed");

    let error = workflow
        .create_booking(user_id, event_id, 5)
        .await
        .expect_err("Second booking should exceed remaining availability");

    assert_eq!(
        error,
        BookingError::InsufficientCapacity {
            requested: 5,
            available: 3,
        }
    );

    // The failed attempt must not change anything.
    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 3);
    assert_eq!(store.bookings_for_event(event_id).len(), 1);
}

#[tokio::test]
async fn test_quantity_bounds_rejected_before_any_lookup() {
    // Nothing seeded: if validation ran after the user lookup these would
    // surface UserNotFound instead.
    let store = InMemoryBookingStore::new();
    let workflow = BookingWorkflow::new(store.clone(), store);
    let user_id = UserId::new();
    let event_id = EventId::new();

    let zero = workflow
        .create_booking(user_id, event_id, 0)
        .await
        .expect_err("Zero tickets should be rejected");
    assert_eq!(zero, BookingError::InvalidQuantity { requested: 0 });

    let eleven = workflow
        .create_booking(user_id, event_id, 11)
        .await
        .expect_err("Eleven tickets should be rejected");
    assert_eq!(eleven, BookingError::InvalidQuantity { requested: 11 });
}

#[tokio::test]
async fn test_unknown_user_books_nothing() {
    let store = InMemoryBookingStore::new();
    let event = open_event(10);
    let event_id = event.event_id;
    store.insert_event(event);
    let workflow = BookingWorkflow::new(store.clone(), store.clone());

    let missing = UserId::new();
    let error = workflow
        .create_booking(missing, event_id, 2)
        .await
        .expect_err("Unknown user should not be able to book");
    assert_eq!(error, BookingError::UserNotFound(missing));

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 10);
    assert!(store.bookings_for_event(event_id).is_empty());
}

#[tokio::test]
async fn test_unknown_event_books_nothing() {
    let store = InMemoryBookingStore::new();
    let user = user_named("bob");
    let user_id = user.id;
    store.insert_user(user);
    let workflow = BookingWorkflow::new(store.clone(), store.clone());

    let missing = EventId::new();
    let error = workflow
        .create_booking(user_id, missing, 2)
        .await
        .expect_err("Unknown event should not be bookable");
    assert_eq!(error, BookingError::EventNotFound(missing));
    assert!(store.bookings_for_event(missing).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_one_ticket_requests_never_oversell() {
    let (store, workflow, user_id, event_id) = setup_workflow(partially_sold_event(20, 5));

    // Release all 10 requests at once so they genuinely contend.
    let barrier = Arc::new(Barrier::new(10));
    let mut tasks = Vec::with_capacity(10);
    for _ in 0..10 {
        let workflow = workflow.clone();
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            workflow.create_booking(user_id, event_id, 1).await
        }));
    }

    let mut succeeded = 0;
    let mut sold_out = 0;
    for result in join_all(tasks).await {
        match result.expect("Booking task panicked") {
            Ok(_) => succeeded += 1,
            Err(BookingError::InsufficientCapacity {
                requested: 1,
                available,
            }) => {
                assert_eq!(available, 0, "A single-ticket request only fails when sold out");
                sold_out += 1;
            }
            Err(other) => panic!("Unexpected error under contention: {other:?}"),
        }
    }

    assert_eq!(succeeded, 5, "Exactly five single-ticket requests should succeed");
    assert_eq!(sold_out, 5, "The other five should see insufficient capacity");

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 0, "Event should sell out exactly");
    assert_eq!(store.bookings_for_event(event_id).len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_last_ticket_goes_to_exactly_one_caller() {
    let (store, workflow, user_id, event_id) = setup_workflow(partially_sold_event(10, 1));

    let workflow2 = workflow.clone();
    let task1 = tokio::spawn(async move { workflow.create_booking(user_id, event_id, 1).await });
    let task2 = tokio::spawn(async move { workflow2.create_booking(user_id, event_id, 1).await });

    let result1 = task1.await.expect("Task 1 panicked");
    let result2 = task2.await.expect("Task 2 panicked");

    let success_count = [result1.is_ok(), result2.is_ok()]
        .iter()
        .filter(|x| **x)
        .count();
    assert_eq!(success_count, 1, "Exactly one caller should win the last ticket");

    let failure = if result1.is_err() { result1 } else { result2 };
    assert!(
        matches!(
            failure,
            Err(BookingError::InsufficientCapacity {
                requested: 1,
                available: 0,
            })
        ),
        "Loser should see the sold-out event, got: {failure:?}"
    );

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 0);
}

#[tokio::test]
async fn test_failed_write_leaves_inventory_untouched() {
    let (store, workflow, user_id, event_id) = setup_workflow(open_event(10));

    store.fail_next_write();
    let error = workflow
        .create_booking(user_id, event_id, 4)
        .await
        .expect_err("Injected fault should fail the reservation");
    assert!(
        matches!(error, BookingError::DatabaseError(_)),
        "Fault should surface as a database error, got: {error:?}"
    );

    // Nothing may be half-applied.
    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 10);
    assert!(store.bookings_for_event(event_id).is_empty());

    // The fault is one-shot; the retry goes through.
    workflow
        .create_booking(user_id, event_id, 4)
        .await
        .expect("Retry after the injected fault should succeed");
    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 6);
    assert_eq!(store.bookings_for_event(event_id).len(), 1);
}

#[tokio::test]
async fn test_held_lock_times_out_as_inventory_busy() {
    let store = InMemoryBookingStore::with_lock_timeout(Duration::from_millis(50));
    let user = user_named("carol");
    let user_id = user.id;
    let event = open_event(10);
    let event_id = event.event_id;
    store.insert_user(user);
    store.insert_event(event);
    let workflow = BookingWorkflow::new(store.clone(), store.clone());

    let guard = store.hold_event_lock(event_id).await;

    let error = workflow
        .create_booking(user_id, event_id, 2)
        .await
        .expect_err("Reservation should give up while the lock is held");
    assert_eq!(error, BookingError::InventoryBusy(event_id));

    // Giving up must not leave a partial write behind.
    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    assert_eq!(inventory.available_tickets, 10);
    assert!(store.bookings_for_event(event_id).is_empty());

    drop(guard);
    workflow
        .create_booking(user_id, event_id, 2)
        .await
        .expect("Booking should succeed once the lock is free");
}

#[tokio::test]
async fn test_locks_are_per_event() {
    let store = InMemoryBookingStore::with_lock_timeout(Duration::from_millis(50));
    let user = user_named("dave");
    let user_id = user.id;
    let contended = open_event(10);
    let independent = open_event(10);
    let independent_id = independent.event_id;
    let contended_id = contended.event_id;
    store.insert_user(user);
    store.insert_event(contended);
    store.insert_event(independent);
    let workflow = BookingWorkflow::new(store.clone(), store.clone());

    // Holding one event's lock must not block bookings for another.
    let _guard = store.hold_event_lock(contended_id).await;
    workflow
        .create_booking(user_id, independent_id, 3)
        .await
        .expect("Booking for an uncontended event should succeed");
}

#[tokio::test]
async fn test_sold_tickets_always_match_recorded_bookings() {
    let (store, workflow, user_id, event_id) = setup_workflow(open_event(25));

    for quantity in [3u16, 10, 1, 7] {
        workflow
            .create_booking(user_id, event_id, quantity)
            .await
            .expect("Booking within availability should succeed");
    }

    // One failing attempt must not skew the ledger.
    let error = workflow
        .create_booking(user_id, event_id, 10)
        .await
        .expect_err("Requesting more than the 4 remaining should fail");
    assert_eq!(
        error,
        BookingError::InsufficientCapacity {
            requested: 10,
            available: 4,
        }
    );

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Inventory should still exist");
    let sold: u32 = store
        .bookings_for_event(event_id)
        .iter()
        .map(|booking| booking.number_of_tickets.as_u32())
        .sum();
    assert_eq!(sold, 21);
    assert_eq!(inventory.total_tickets - inventory.available_tickets, sold);
    assert!(inventory.available_tickets <= inventory.total_tickets);
}

#[tokio::test]
async fn test_fetch_inventory_reports_current_counts() {
    let store = InMemoryBookingStore::new();
    let event = partially_sold_event(100, 42);
    let event_id = event.event_id;
    store.insert_event(event);

    let inventory = store
        .fetch_inventory(event_id)
        .await
        .expect("Seeded inventory should resolve");
    assert_eq!(inventory.total_tickets, 100);
    assert_eq!(inventory.available_tickets, 42);

    let missing = EventId::new();
    let error = store
        .fetch_inventory(missing)
        .await
        .expect_err("Unknown event should not resolve");
    assert_eq!(error, BookingError::EventNotFound(missing));
}

#[tokio::test]
async fn test_find_user_resolves_only_known_ids() {
    let store = InMemoryBookingStore::new();
    let user = user_named("erin");
    let user_id = user.id;
    store.insert_user(user);

    let found = store
        .find_user(user_id)
        .await
        .expect("Known user should resolve");
    assert_eq!(found.id, user_id);
    assert_eq!(found.username, "erin");
    assert_eq!(found.email, "erin@example.com");

    let missing = UserId::new();
    let error = store
        .find_user(missing)
        .await
        .expect_err("Unknown user should not resolve");
    assert_eq!(error, BookingError::UserNotFound(missing));
}
