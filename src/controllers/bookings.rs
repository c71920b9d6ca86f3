use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    controllers::extract::{ValidJson, ValidPath},
    error::AppError,
    middleware::AuthUser,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/user", get(list_user_bookings))
        .route("/bookings/{id}/cancel", patch(cancel_booking))
}

/// Seats as a JSON list or a comma-separated string (`"A1,A2"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeatSelection {
    List(Vec<String>),
    Csv(String),
}

impl SeatSelection {
    pub fn into_labels(self) -> Vec<String> {
        match self {
            SeatSelection::List(seats) => seats,
            SeatSelection::Csv(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub movie_id: Uuid,
    pub showtime_id: Uuid,
    pub seats: SeatSelection,
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(req): ValidJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let seats = req.seats.into_labels();
    let booking = state
        .bookings
        .create_booking(&user, req.movie_id, req.showtime_id, &seats)
        .await?;
    state.cache.invalidate_showtime(booking.showtime_id, booking.movie_id).await;

    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.cancel_booking(&user, id).await?;
    state.cache.invalidate_showtime(booking.showtime_id, booking.movie_id).await;

    Ok(Json(booking))
}

// GET /api/bookings/user - newest first
async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.bookings.list_user_bookings(&user).await?;
    Ok(Json(bookings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_accept_list_or_comma_string() {
        let list: SeatSelection = serde_json::from_str(r#"["A1","A2"]"#).unwrap();
        assert_eq!(list.into_labels(), vec!["A1", "A2"]);

        let csv: SeatSelection = serde_json::from_str(r#"" A1, A2 ,""#).unwrap();
        assert_eq!(csv.into_labels(), vec!["A1", "A2"]);
    }
}
