use axum::{
    extract::State,
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{controllers::extract::ValidPath, error::AppError, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/showtimes/{id}", get(get_showtime))
}

// GET /api/showtimes/{id} - seat pool for the booking screen
async fn get_showtime(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(showtime) = state.cache.get_showtime(id).await {
        return Ok(([("X-Cache", HeaderValue::from_static("HIT"))], Json(showtime)));
    }

    let showtime = state.admin.get_showtime(id).await?;
    state.cache.cache_showtime(&showtime).await;
    Ok(([("X-Cache", HeaderValue::from_static("MISS"))], Json(showtime)))
}
