use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    controllers::{
        extract::{ValidJson, ValidPath, ValidQuery},
        movies::ShowtimesQuery,
    },
    error::AppError,
    middleware::AdminUser,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/profile", get(profile))
        .route("/admin/stats", get(stats))
        .route("/admin/showtimes", get(list_showtimes).post(create_showtime))
        .route("/admin/showtimes/{id}", get(get_showtime).delete(delete_showtime))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShowtimeRequest {
    pub movie_id: Uuid,
    pub time: DateTime<Utc>,
}

// GET /api/admin/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.profile(admin.id).await?;
    Ok(Json(json!({ "user": user })))
}

// GET /api/admin/stats
async fn stats(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.admin.stats().await?;
    Ok(Json(stats))
}

// GET /api/admin/showtimes?movieId=
async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidQuery(params): ValidQuery<ShowtimesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let showtimes = state.admin.list_showtimes_by_movie(params.movie_id).await?;
    Ok(Json(showtimes))
}

// GET /api/admin/showtimes/{id}
async fn get_showtime(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let showtime = state.admin.get_showtime(id).await?;
    Ok(Json(showtime))
}

// POST /api/admin/showtimes
async fn create_showtime(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidJson(req): ValidJson<CreateShowtimeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let showtime = state.admin.create_showtime(req.movie_id, req.time).await?;
    state.cache.invalidate_showtime(showtime.id, showtime.movie_id).await;
    Ok((StatusCode::CREATED, Json(showtime)))
}

// DELETE /api/admin/showtimes/{id} - bookings of the showtime are kept
async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let showtime = state.admin.delete_showtime(id).await?;
    state.cache.invalidate_showtime(showtime.id, showtime.movie_id).await;
    Ok(Json(json!({ "message": "Showtime removed" })))
}
