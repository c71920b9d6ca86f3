//! Runs against a real Postgres. Set `DATABASE_URL` and pass `--ignored`.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use cinema_booking::{
    config::DatabaseConfig,
    database::Database,
    error::AppError,
    models::{seat::TOTAL_SEATS, Booking, BookingStatus, SeatLabel, SeatPool, Showtime},
    repositories::{BookingRepository, ShowtimeRepository},
};

async fn database() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let config = DatabaseConfig {
        url: Some(url.clone()),
        pool_size: 8,
        acquire_timeout_secs: 10,
        in_memory: false,
    };
    let db = Database::connect(&url, &config).await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn fresh_showtime(db: &Database) -> Showtime {
    let showtime = Showtime::new(Uuid::new_v4(), Utc::now());
    ShowtimeRepository::create(db, &showtime).await.unwrap()
}

fn seats(labels: &[&str]) -> Vec<SeatLabel> {
    labels.iter().map(|l| l.parse().unwrap()).collect()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn conflicting_reserve_leaves_pool_unchanged() {
    let db = database().await;
    let showtime = fresh_showtime(&db).await;

    let after = db.reserve_seats(showtime.id, &seats(&["E1"])).await.unwrap();
    assert_eq!(after.available_seats.len(), TOTAL_SEATS - 1);

    let err = db
        .reserve_seats(showtime.id, &seats(&["E2", "E1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SeatUnavailable(ref s) if s == "E1"));

    let stored = ShowtimeRepository::find_by_id(&db, showtime.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, after.available_seats);
    assert!(stored.available_seats.contains(&"E2".to_string()));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn reserve_keeps_grid_order_of_remaining_seats() {
    let db = database().await;
    let showtime = fresh_showtime(&db).await;

    let after = db.reserve_seats(showtime.id, &seats(&["A2", "J10"])).await.unwrap();
    let mut expected = SeatPool::full();
    expected.reserve(&seats(&["A2", "J10"])).unwrap();
    assert_eq!(after.available_seats, expected.labels());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn release_restores_grid_order_without_duplicates() {
    let db = database().await;
    let showtime = fresh_showtime(&db).await;

    db.reserve_seats(showtime.id, &seats(&["A1", "A10", "B3", "J10"])).await.unwrap();

    let partial = db
        .release_seats(showtime.id, &seats(&["B3", "A10"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(partial.available_seats.len(), TOTAL_SEATS - 2);
    assert_eq!(partial.available_seats, SeatPool::from_stored(&partial.available_seats).labels());

    // A10 is already free and must not show up twice
    db.release_seats(showtime.id, &seats(&["A10"])).await.unwrap();
    let restored = db
        .release_seats(showtime.id, &seats(&["J10", "A1"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.available_seats, SeatPool::full().labels());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn missing_showtime_is_reported() {
    let db = database().await;
    let id = Uuid::new_v4();

    let err = db.reserve_seats(id, &seats(&["A1"])).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("Showtime")));
    assert!(db.release_seats(id, &seats(&["A1"])).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_reserves_have_one_winner() {
    let db = Arc::new(database().await);
    let showtime = fresh_showtime(&db).await;

    let id = showtime.id;
    let mut handles = Vec::new();
    for _ in 0..16 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.reserve_seats(id, &seats(&["C5", "C6"])).await
        }));
    }

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::SeatUnavailable(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(won, 1);

    let stored = ShowtimeRepository::find_by_id(db.as_ref(), showtime.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.available_seats.len(), TOTAL_SEATS - 2);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn cancel_and_restore_are_conditional() {
    let db = database().await;
    let booking = Booking::confirmed(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), vec!["A1".into()]);
    BookingRepository::create(&db, &booking).await.unwrap();

    assert!(db.restore_confirmed(booking.id).await.unwrap().is_none());
    let cancelled = db.mark_cancelled(booking.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(db.mark_cancelled(booking.id).await.unwrap().is_none());

    let restored = db.restore_confirmed(booking.id).await.unwrap().unwrap();
    assert_eq!(restored.status, BookingStatus::Confirmed);
}
