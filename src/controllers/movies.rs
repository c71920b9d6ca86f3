use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    controllers::extract::{ValidJson, ValidPath, ValidQuery},
    error::AppError,
    middleware::AdminUser,
    models::{MovieChanges, NewMovie},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/showtimes", get(list_showtimes))
        .route("/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(range(min = 1, message = "duration must be a positive number of minutes"))]
    pub duration: i32,
    #[validate(length(min = 1, message = "genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "poster is required"))]
    pub poster: String,
    #[validate(range(min = 0.0, message = "ticketPrice must not be negative"))]
    pub ticket_price: Option<f64>,
}

impl From<CreateMovieRequest> for NewMovie {
    fn from(req: CreateMovieRequest) -> Self {
        NewMovie {
            title: req.title,
            description: req.description,
            duration: req.duration,
            genre: req.genre,
            poster: req.poster,
            ticket_price: req.ticket_price,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "duration must be a positive number of minutes"))]
    pub duration: Option<i32>,
    #[validate(length(min = 1, message = "genre must not be empty"))]
    pub genre: Option<String>,
    #[validate(length(min = 1, message = "poster must not be empty"))]
    pub poster: Option<String>,
    #[validate(range(min = 0.0, message = "ticketPrice must not be negative"))]
    pub ticket_price: Option<f64>,
}

impl From<UpdateMovieRequest> for MovieChanges {
    fn from(req: UpdateMovieRequest) -> Self {
        MovieChanges {
            title: req.title,
            description: req.description,
            duration: req.duration,
            genre: req.genre,
            poster: req.poster,
            ticket_price: req.ticket_price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowtimesQuery {
    pub movie_id: Option<Uuid>,
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    if let Some(movies) = state.cache.get_movies().await {
        return Ok(Json(movies));
    }

    let movies = state.admin.list_movies().await?;
    state.cache.cache_movies(&movies).await;
    Ok(Json(movies))
}

// GET /api/movies/{id} - movie with its showtimes
async fn get_movie(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let movie = state.admin.get_movie_with_showtimes(id).await?;
    Ok(Json(movie))
}

// GET /api/movies/showtimes?movieId=
async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ShowtimesQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(movie_id) = params.movie_id {
        if let Some(showtimes) = state.cache.get_movie_showtimes(movie_id).await {
            return Ok(Json(showtimes));
        }
    }

    let showtimes = state.admin.list_showtimes_by_movie(params.movie_id).await?;
    if let Some(movie_id) = params.movie_id {
        state.cache.cache_movie_showtimes(movie_id, &showtimes).await;
    }
    Ok(Json(showtimes))
}

// POST /api/movies
async fn create_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ValidJson(req): ValidJson<CreateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let movie = state.admin.create_movie(&admin, req.into()).await?;
    state.cache.invalidate_movies().await;
    Ok((StatusCode::CREATED, Json(movie)))
}

// PUT /api/movies/{id}
async fn update_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(req): ValidJson<UpdateMovieRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let movie = state.admin.update_movie(id, req.into()).await?;
    state.cache.invalidate_movies().await;
    Ok(Json(movie))
}

// DELETE /api/movies/{id} - removes the movie's showtimes and bookings too
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let removal = state.admin.delete_movie(id).await?;
    state.cache.invalidate_movie(removal.movie_id, &removal.showtime_ids).await;

    Ok(Json(json!({
        "message": "Movie and related showtimes/bookings removed",
        "showtimesDeleted": removal.showtimes_deleted,
        "bookingsDeleted": removal.bookings_deleted,
    })))
}
