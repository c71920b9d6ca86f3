use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{SeatLabel, Showtime};
use crate::repositories::ShowtimeRepository;

/// Applies reserve/release transitions to a showtime's seat pool.
#[derive(Clone)]
pub struct SeatInventory {
    showtimes: Arc<dyn ShowtimeRepository>,
}

impl SeatInventory {
    pub fn new(showtimes: Arc<dyn ShowtimeRepository>) -> Self {
        Self { showtimes }
    }

    /// Validates a seat request: non-empty, grid labels only, no repeats.
    /// Request order is kept.
    pub fn parse_request<S: AsRef<str>>(requested: &[S]) -> Result<Vec<SeatLabel>, AppError> {
        if requested.is_empty() {
            return Err(AppError::Validation("at least one seat must be requested".into()));
        }

        let mut seen = HashSet::with_capacity(requested.len());
        let mut seats = Vec::with_capacity(requested.len());
        for raw in requested {
            let raw = raw.as_ref().trim();
            let seat: SeatLabel = raw
                .parse()
                .map_err(|e: crate::models::seat::InvalidSeatLabel| AppError::Validation(e.to_string()))?;
            if !seen.insert(seat) {
                return Err(AppError::Validation(format!("seat {} requested more than once", seat)));
            }
            seats.push(seat);
        }
        Ok(seats)
    }

    pub async fn reserve(&self, showtime_id: Uuid, seats: &[SeatLabel]) -> Result<Showtime, AppError> {
        if seats.is_empty() {
            return Err(AppError::Validation("at least one seat must be requested".into()));
        }

        match self.showtimes.reserve_seats(showtime_id, seats).await {
            Ok(showtime) => {
                info!(
                    "Reserved {} seat(s) for showtime {}, {} left",
                    seats.len(),
                    showtime_id,
                    showtime.available_seats.len()
                );
                Ok(showtime)
            }
            Err(AppError::SeatUnavailable(seat)) => {
                debug!("Seat {} unavailable for showtime {}", seat, showtime_id);
                Err(AppError::SeatUnavailable(seat))
            }
            Err(e) => Err(e),
        }
    }

    /// Returns seats to the pool. A missing showtime is tolerated and logged.
    pub async fn release(&self, showtime_id: Uuid, seats: &[SeatLabel]) -> Result<Option<Showtime>, AppError> {
        let released = self.showtimes.release_seats(showtime_id, seats).await?;
        match &released {
            Some(showtime) => info!(
                "Released {} seat(s) for showtime {}, {} available",
                seats.len(),
                showtime_id,
                showtime.available_seats.len()
            ),
            None => warn!(
                "Showtime {} no longer exists, {} seat(s) not returned",
                showtime_id,
                seats.len()
            ),
        }
        Ok(released)
    }
}
