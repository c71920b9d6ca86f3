use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Booking, SeatLabel};
use crate::repositories::Repositories;
use crate::services::notification::{self, BookingConfirmation, Notifier};
use crate::services::seat_inventory::SeatInventory;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedMovie {
    pub id: Uuid,
    pub title: String,
    pub poster: String,
    pub ticket_price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedShowtime {
    pub id: Uuid,
    pub time: DateTime<Utc>,
}

/// A booking with the movie and showtime details needed for a history view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub movie: Option<BookedMovie>,
    pub showtime: Option<BookedShowtime>,
    pub total_price: Option<f64>,
}

#[derive(Clone)]
pub struct BookingService {
    repos: Repositories,
    seats: SeatInventory,
    notifier: Arc<dyn Notifier>,
}

pub fn format_showtime(time: DateTime<Utc>) -> String {
    time.format("%A, %B %-d, %Y %H:%M UTC").to_string()
}

impl BookingService {
    pub fn new(repos: Repositories, notifier: Arc<dyn Notifier>) -> Self {
        let seats = SeatInventory::new(repos.showtimes.clone());
        Self { repos, seats, notifier }
    }

    pub async fn create_booking(
        &self,
        user: &AuthUser,
        movie_id: Uuid,
        showtime_id: Uuid,
        requested: &[String],
    ) -> Result<Booking, AppError> {
        let seats = SeatInventory::parse_request(requested)?;

        let showtime = self
            .repos
            .showtimes
            .find_by_id(showtime_id)
            .await?
            .ok_or(AppError::NotFound("Showtime"))?;
        if showtime.movie_id != movie_id {
            return Err(AppError::Validation(format!(
                "showtime {} is not a screening of movie {}",
                showtime_id, movie_id
            )));
        }

        self.seats.reserve(showtime_id, &seats).await?;

        let booking = Booking::confirmed(
            user.id,
            movie_id,
            showtime_id,
            seats.iter().map(ToString::to_string).collect(),
        );
        let booking = match self.repos.bookings.create(&booking).await {
            Ok(booking) => booking,
            Err(e) => {
                error!("Booking write failed for showtime {}, returning seats: {}", showtime_id, e);
                if let Err(release_err) = self.seats.release(showtime_id, &seats).await {
                    error!(
                        "Could not return seats {:?} to showtime {}: {}",
                        booking.seats, showtime_id, release_err
                    );
                }
                return Err(e);
            }
        };

        info!(
            "Booking {} confirmed: user {} seats {:?} showtime {}",
            booking.id, user.id, booking.seats, showtime_id
        );

        self.notify_confirmation(&booking);
        Ok(booking)
    }

    // Runs entirely on a detached task, lookups included.
    fn notify_confirmation(&self, booking: &Booking) {
        let repos = self.repos.clone();
        let notifier = self.notifier.clone();
        let booking = booking.clone();

        tokio::spawn(async move {
            let message = match confirmation_for(&repos, &booking).await {
                Ok(message) => message,
                Err(e) => {
                    error!("Failed to prepare confirmation for booking {}: {}", booking.id, e);
                    return;
                }
            };
            notification::deliver(notifier.as_ref(), &message).await;
        });
    }

    pub async fn cancel_booking(&self, user: &AuthUser, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .repos
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::NotFound("Booking"))?;

        if booking.user_id != user.id {
            return Err(AppError::Unauthorized("booking belongs to another user".into()));
        }
        if !booking.is_active() {
            return Err(AppError::InvalidState("booking is already cancelled".into()));
        }

        // Lost a race with another cancel for the same booking
        let cancelled = self
            .repos
            .bookings
            .mark_cancelled(booking_id)
            .await?
            .ok_or_else(|| AppError::InvalidState("booking is already cancelled".into()))?;

        let seats: Vec<SeatLabel> = cancelled
            .seats
            .iter()
            .filter_map(|s| match s.parse() {
                Ok(seat) => Some(seat),
                Err(_) => {
                    warn!("Booking {} holds unknown seat label {}", cancelled.id, s);
                    None
                }
            })
            .collect();
        if let Err(e) = self.seats.release(cancelled.showtime_id, &seats).await {
            error!(
                "Could not return seats of booking {} to showtime {}, restoring it: {}",
                cancelled.id, cancelled.showtime_id, e
            );
            match self.repos.bookings.restore_confirmed(cancelled.id).await {
                Ok(Some(_)) => {}
                Ok(None) => warn!("Booking {} changed state before it could be restored", cancelled.id),
                Err(restore_err) => error!(
                    "Booking {} is cancelled but still holds seats {:?}: {}",
                    cancelled.id, cancelled.seats, restore_err
                ),
            }
            return Err(e);
        }

        info!("Booking {} cancelled by user {}", cancelled.id, user.id);
        Ok(cancelled)
    }

    pub async fn list_user_bookings(&self, user: &AuthUser) -> Result<Vec<BookingDetails>, AppError> {
        let bookings = self.repos.bookings.list_by_user(user.id).await?;

        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let (movie, showtime) = futures::try_join!(
                self.repos.movies.find_by_id(booking.movie_id),
                self.repos.showtimes.find_by_id(booking.showtime_id),
            )?;

            let movie = movie.map(|m| BookedMovie {
                id: m.id,
                title: m.title,
                poster: m.poster,
                ticket_price: m.ticket_price,
            });
            let total_price = movie
                .as_ref()
                .map(|m| m.ticket_price * booking.seats.len() as f64);

            details.push(BookingDetails {
                movie,
                showtime: showtime.map(|s| BookedShowtime { id: s.id, time: s.time }),
                total_price,
                booking,
            });
        }
        Ok(details)
    }
}

async fn confirmation_for(repos: &Repositories, booking: &Booking) -> Result<BookingConfirmation, AppError> {
    let (user, movie, showtime) = futures::try_join!(
        repos.users.find_by_id(booking.user_id),
        repos.movies.find_by_id(booking.movie_id),
        repos.showtimes.find_by_id(booking.showtime_id),
    )?;

    let user = user.ok_or(AppError::NotFound("User"))?;
    let movie = movie.ok_or(AppError::NotFound("Movie"))?;

    Ok(BookingConfirmation {
        recipient: user.email,
        name: user.name,
        movie_title: movie.title,
        showtime: showtime.map(|s| format_showtime(s.time)).unwrap_or_default(),
        seats: booking.seats.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, Movie, NewMovie, Role, Showtime};
    use crate::repositories::{MemoryStore, ShowtimeRepository};
    use crate::services::notification::LogNotifier;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory showtimes whose `release_seats` can be made to fail.
    struct FlakyShowtimes {
        inner: Arc<MemoryStore>,
        fail_release: AtomicBool,
    }

    #[async_trait]
    impl ShowtimeRepository for FlakyShowtimes {
        async fn create(&self, showtime: &Showtime) -> Result<Showtime, AppError> {
            ShowtimeRepository::create(self.inner.as_ref(), showtime).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Showtime>, AppError> {
            ShowtimeRepository::find_by_id(self.inner.as_ref(), id).await
        }
        async fn list_by_movie(&self, movie_id: Uuid) -> Result<Vec<Showtime>, AppError> {
            self.inner.list_by_movie(movie_id).await
        }
        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            ShowtimeRepository::delete(self.inner.as_ref(), id).await
        }
        async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError> {
            ShowtimeRepository::delete_by_movie(self.inner.as_ref(), movie_id).await
        }
        async fn count(&self) -> Result<i64, AppError> {
            ShowtimeRepository::count(self.inner.as_ref()).await
        }
        async fn reserve_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Showtime, AppError> {
            self.inner.reserve_seats(id, seats).await
        }
        async fn release_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Option<Showtime>, AppError> {
            if self.fail_release.load(Ordering::SeqCst) {
                return Err(AppError::Store(sqlx::Error::PoolTimedOut));
            }
            self.inner.release_seats(id, seats).await
        }
    }

    async fn flaky_setup() -> (BookingService, Arc<FlakyShowtimes>, Showtime) {
        let store = Arc::new(MemoryStore::new());
        let showtimes = Arc::new(FlakyShowtimes {
            inner: store.clone(),
            fail_release: AtomicBool::new(false),
        });
        let repos = Repositories {
            users: store.clone(),
            movies: store.clone(),
            showtimes: showtimes.clone(),
            bookings: store,
        };

        let movie = Movie::new(
            NewMovie {
                title: "Alien".into(),
                description: "In space".into(),
                duration: 117,
                genre: "Horror".into(),
                poster: "p.jpg".into(),
                ticket_price: None,
            },
            Uuid::new_v4(),
        );
        let movie = repos.movies.create(&movie).await.unwrap();
        let showtime = repos
            .showtimes
            .create(&Showtime::new(movie.id, Utc::now()))
            .await
            .unwrap();

        (BookingService::new(repos, Arc::new(LogNotifier)), showtimes, showtime)
    }

    #[test]
    fn showtime_is_formatted_for_humans() {
        let time = Utc.with_ymd_and_hms(2025, 5, 2, 20, 0, 0).unwrap();
        assert_eq!(format_showtime(time), "Friday, May 2, 2025 20:00 UTC");
    }

    #[tokio::test]
    async fn failed_release_keeps_the_booking_cancellable() {
        let (service, showtimes, showtime) = flaky_setup().await;
        let user = AuthUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        let booking = service
            .create_booking(&user, showtime.movie_id, showtime.id, &["A1".to_string()])
            .await
            .unwrap();

        showtimes.fail_release.store(true, Ordering::SeqCst);
        let err = service.cancel_booking(&user, booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));

        // Still confirmed, still holding A1
        let stored = service.repos.bookings.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        let pool = showtimes.find_by_id(showtime.id).await.unwrap().unwrap().pool();
        assert_eq!(pool.len(), 99);
        assert!(!pool.contains(&"A1".parse().unwrap()));

        showtimes.fail_release.store(false, Ordering::SeqCst);
        let cancelled = service.cancel_booking(&user, booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        let pool = showtimes.find_by_id(showtime.id).await.unwrap().unwrap().pool();
        assert_eq!(pool.len(), 100);
    }
}
