use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookingRepository, MovieRepository, ShowtimeRepository, UserRepository};
use crate::error::AppError;
use crate::models::{Booking, BookingStatus, Movie, Role, SeatLabel, Showtime, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    movies: HashMap<Uuid, Movie>,
    showtimes: HashMap<Uuid, Showtime>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-process store. Every mutation runs under a single write guard, so the
/// conditional seat update is as atomic here as it is in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!("email {} is already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().filter(|u| u.role == role).count() as i64)
    }
}

#[async_trait]
impl MovieRepository for MemoryStore {
    async fn create(&self, movie: &Movie) -> Result<Movie, AppError> {
        self.tables.write().await.movies.insert(movie.id, movie.clone());
        Ok(movie.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        Ok(self.tables.read().await.movies.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Movie>, AppError> {
        let mut movies: Vec<Movie> = self.tables.read().await.movies.values().cloned().collect();
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(movies)
    }

    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.movies.get_mut(&movie.id) {
            Some(stored) => {
                *stored = movie.clone();
                Ok(Some(movie.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.movies.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.movies.len() as i64)
    }
}

#[async_trait]
impl ShowtimeRepository for MemoryStore {
    async fn create(&self, showtime: &Showtime) -> Result<Showtime, AppError> {
        self.tables.write().await.showtimes.insert(showtime.id, showtime.clone());
        Ok(showtime.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Showtime>, AppError> {
        Ok(self.tables.read().await.showtimes.get(&id).cloned())
    }

    async fn list_by_movie(&self, movie_id: Uuid) -> Result<Vec<Showtime>, AppError> {
        let tables = self.tables.read().await;
        let mut showtimes: Vec<Showtime> = tables
            .showtimes
            .values()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        showtimes.sort_by_key(|s| s.time);
        Ok(showtimes)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.showtimes.remove(&id).is_some())
    }

    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.showtimes.len();
        tables.showtimes.retain(|_, s| s.movie_id != movie_id);
        Ok((before - tables.showtimes.len()) as u64)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().await.showtimes.len() as i64)
    }

    async fn reserve_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Showtime, AppError> {
        let mut tables = self.tables.write().await;
        let showtime = tables.showtimes.get_mut(&id).ok_or(AppError::NotFound("Showtime"))?;

        let mut pool = showtime.pool();
        pool.reserve(seats)
            .map_err(|seat| AppError::SeatUnavailable(seat.to_string()))?;

        showtime.available_seats = pool.labels();
        showtime.updated_at = Utc::now();
        Ok(showtime.clone())
    }

    async fn release_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Option<Showtime>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(showtime) = tables.showtimes.get_mut(&id) else {
            return Ok(None);
        };

        let mut pool = showtime.pool();
        pool.release(seats);

        showtime.available_seats = pool.labels();
        showtime.updated_at = Utc::now();
        Ok(Some(showtime.clone()))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.tables.write().await.bookings.insert(booking.id, booking.clone());
        Ok(booking.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Confirmed => {
                booking.status = BookingStatus::Cancelled;
                booking.updated_at = Utc::now();
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn restore_confirmed(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.write().await;
        match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Cancelled => {
                booking.status = BookingStatus::Confirmed;
                booking.updated_at = Utc::now();
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.bookings.len();
        tables.bookings.retain(|_, b| b.movie_id != movie_id);
        Ok((before - tables.bookings.len()) as u64)
    }

    async fn count_by_status(&self, status: BookingStatus) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.values().filter(|b| b.status == status).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seats(labels: &[&str]) -> Vec<SeatLabel> {
        labels.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn failed_reservation_leaves_pool_untouched() {
        let store = MemoryStore::new();
        let showtime = Showtime::new(Uuid::new_v4(), Utc::now() + Duration::days(1));
        ShowtimeRepository::create(&store, &showtime).await.unwrap();

        store.reserve_seats(showtime.id, &seats(&["E1"])).await.unwrap();
        let err = store
            .reserve_seats(showtime.id, &seats(&["E2", "E1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SeatUnavailable(ref s) if s == "E1"));

        let stored = ShowtimeRepository::find_by_id(&store, showtime.id).await.unwrap().unwrap();
        assert_eq!(stored.available_seats.len(), 99);
        assert!(stored.available_seats.contains(&"E2".to_string()));
    }

    #[tokio::test]
    async fn release_into_missing_showtime_is_none() {
        let store = MemoryStore::new();
        let released = store.release_seats(Uuid::new_v4(), &seats(&["A1"])).await.unwrap();
        assert!(released.is_none());
    }

    #[tokio::test]
    async fn cancel_flips_only_once() {
        let store = MemoryStore::new();
        let booking = Booking::confirmed(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), vec!["A1".into()]);
        BookingRepository::create(&store, &booking).await.unwrap();

        assert!(store.mark_cancelled(booking.id).await.unwrap().is_some());
        assert!(store.mark_cancelled(booking.id).await.unwrap().is_none());

        let restored = store.restore_confirmed(booking.id).await.unwrap().unwrap();
        assert_eq!(restored.status, BookingStatus::Confirmed);
        assert!(store.restore_confirmed(booking.id).await.unwrap().is_none());
    }
}
