//! Storage seams. Services only see these traits; `postgres` backs them with
//! sqlx and `memory` with an in-process map for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::Database;
use crate::error::AppError;
use crate::models::{Booking, BookingStatus, Movie, Role, SeatLabel, Showtime, User};

pub use memory::MemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn count_by_role(&self, role: Role) -> Result<i64, AppError>;
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn create(&self, movie: &Movie) -> Result<Movie, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Movie>, AppError>;
    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait ShowtimeRepository: Send + Sync {
    async fn create(&self, showtime: &Showtime) -> Result<Showtime, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Showtime>, AppError>;
    /// Ordered by screening time.
    async fn list_by_movie(&self, movie_id: Uuid) -> Result<Vec<Showtime>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError>;
    async fn count(&self) -> Result<i64, AppError>;

    /// Removes every seat in `seats` from the pool in one conditional step.
    /// Fails with `SeatUnavailable` naming the first seat that is not free,
    /// in which case nothing is removed.
    async fn reserve_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Showtime, AppError>;

    /// Adds seats back with set semantics. `None` when the showtime is gone.
    async fn release_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Option<Showtime>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;
    /// `confirmed -> cancelled`. `None` when the booking is missing or was
    /// not confirmed at the time of the update.
    async fn mark_cancelled(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    /// `cancelled -> confirmed`, undoing a cancel whose seats could not be
    /// returned.
    async fn restore_confirmed(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError>;
    async fn count_by_status(&self, status: BookingStatus) -> Result<i64, AppError>;
}

/// Storage context handed to every service.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub showtimes: Arc<dyn ShowtimeRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    pub fn postgres(db: Database) -> Self {
        let db = Arc::new(db);
        Self {
            users: db.clone(),
            movies: db.clone(),
            showtimes: db.clone(),
            bookings: db,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            movies: store.clone(),
            showtimes: store.clone(),
            bookings: store,
        }
    }
}
