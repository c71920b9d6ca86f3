use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_TICKET_PRICE: f64 = 10.0;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Running time in minutes.
    pub duration: i32,
    pub genre: String,
    pub poster: String,
    pub ticket_price: f64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub genre: String,
    pub poster: String,
    pub ticket_price: Option<f64>,
}

/// Attribute set accepted by update. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<i32>,
    pub genre: Option<String>,
    pub poster: Option<String>,
    pub ticket_price: Option<f64>,
}

impl Movie {
    pub fn new(input: NewMovie, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            duration: input.duration,
            genre: input.genre,
            poster: input.poster,
            ticket_price: input.ticket_price.unwrap_or(DEFAULT_TICKET_PRICE),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: MovieChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(duration) = changes.duration {
            self.duration = duration;
        }
        if let Some(genre) = changes.genre {
            self.genre = genre;
        }
        if let Some(poster) = changes.poster {
            self.poster = poster;
        }
        if let Some(price) = changes.ticket_price {
            self.ticket_price = price;
        }
        self.updated_at = Utc::now();
    }
}
