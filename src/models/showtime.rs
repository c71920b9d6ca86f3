use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::seat::SeatPool;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub time: DateTime<Utc>,
    pub available_seats: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Showtime {
    /// New screening with the full seat grid.
    pub fn new(movie_id: Uuid, time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            movie_id,
            time,
            available_seats: SeatPool::full().labels(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pool(&self) -> SeatPool {
        SeatPool::from_stored(&self.available_seats)
    }
}
