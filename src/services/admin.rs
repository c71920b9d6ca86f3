use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{BookingStatus, Movie, MovieChanges, NewMovie, Role, Showtime};
use crate::repositories::Repositories;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieWithShowtimes {
    #[serde(flatten)]
    pub movie: Movie,
    pub showtimes: Vec<Showtime>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_movies: i64,
    pub total_users: i64,
    pub total_showtimes: i64,
    pub active_bookings: i64,
}

/// What a movie deletion took with it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRemoval {
    pub movie_id: Uuid,
    pub showtime_ids: Vec<Uuid>,
    pub showtimes_deleted: u64,
    pub bookings_deleted: u64,
}

/// Catalog management: movies, showtimes, and the dashboard counters.
#[derive(Clone)]
pub struct AdminService {
    repos: Repositories,
}

impl AdminService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list_movies(&self) -> Result<Vec<Movie>, AppError> {
        self.repos.movies.list().await
    }

    pub async fn get_movie(&self, id: Uuid) -> Result<Movie, AppError> {
        self.repos
            .movies
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Movie"))
    }

    pub async fn get_movie_with_showtimes(&self, id: Uuid) -> Result<MovieWithShowtimes, AppError> {
        let movie = self.get_movie(id).await?;
        let showtimes = self.repos.showtimes.list_by_movie(id).await?;
        Ok(MovieWithShowtimes { movie, showtimes })
    }

    pub async fn create_movie(&self, admin: &AuthUser, input: NewMovie) -> Result<Movie, AppError> {
        let movie = self.repos.movies.create(&Movie::new(input, admin.id)).await?;
        info!("Movie {} '{}' created by {}", movie.id, movie.title, admin.id);
        Ok(movie)
    }

    pub async fn update_movie(&self, id: Uuid, changes: MovieChanges) -> Result<Movie, AppError> {
        let mut movie = self.get_movie(id).await?;
        movie.apply(changes);
        let movie = self
            .repos
            .movies
            .update(&movie)
            .await?
            .ok_or(AppError::NotFound("Movie"))?;
        info!("Movie {} updated", movie.id);
        Ok(movie)
    }

    /// Deletes showtimes, then bookings, then the movie. There is no
    /// transaction around the three steps.
    pub async fn delete_movie(&self, id: Uuid) -> Result<MovieRemoval, AppError> {
        let movie = self.get_movie(id).await?;

        let showtime_ids = self
            .repos
            .showtimes
            .list_by_movie(movie.id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let showtimes_deleted = self.repos.showtimes.delete_by_movie(movie.id).await?;
        let bookings_deleted = self.repos.bookings.delete_by_movie(movie.id).await?;
        self.repos.movies.delete(movie.id).await?;

        info!(
            "Movie {} removed with {} showtime(s) and {} booking(s)",
            movie.id, showtimes_deleted, bookings_deleted
        );
        Ok(MovieRemoval {
            movie_id: movie.id,
            showtime_ids,
            showtimes_deleted,
            bookings_deleted,
        })
    }

    pub async fn create_showtime(&self, movie_id: Uuid, time: DateTime<Utc>) -> Result<Showtime, AppError> {
        let movie = self.get_movie(movie_id).await?;
        let showtime = self.repos.showtimes.create(&Showtime::new(movie.id, time)).await?;
        info!("Showtime {} for movie {} at {}", showtime.id, movie.id, showtime.time);
        Ok(showtime)
    }

    /// Bookings of the showtime are left in place.
    pub async fn delete_showtime(&self, id: Uuid) -> Result<Showtime, AppError> {
        let showtime = self.get_showtime(id).await?;
        if !self.repos.showtimes.delete(id).await? {
            return Err(AppError::NotFound("Showtime"));
        }
        info!("Showtime {} removed", id);
        Ok(showtime)
    }

    pub async fn get_showtime(&self, id: Uuid) -> Result<Showtime, AppError> {
        self.repos
            .showtimes
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Showtime"))
    }

    pub async fn list_showtimes_by_movie(&self, movie_id: Option<Uuid>) -> Result<Vec<Showtime>, AppError> {
        let movie_id = movie_id.ok_or_else(|| AppError::Validation("movieId is required".into()))?;
        self.repos.showtimes.list_by_movie(movie_id).await
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let (total_movies, total_users, total_showtimes, active_bookings) = futures::try_join!(
            self.repos.movies.count(),
            self.repos.users.count_by_role(Role::User),
            self.repos.showtimes.count(),
            self.repos.bookings.count_by_status(BookingStatus::Confirmed),
        )?;
        Ok(DashboardStats {
            total_movies,
            total_users,
            total_showtimes,
            active_bookings,
        })
    }
}
