use async_trait::async_trait;
use uuid::Uuid;

use super::{BookingRepository, MovieRepository, ShowtimeRepository, UserRepository};
use crate::database::Database;
use crate::error::AppError;
use crate::models::{Booking, BookingStatus, Movie, Role, SeatLabel, Showtime, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const MOVIE_COLUMNS: &str =
    "id, title, description, duration, genre, poster, ticket_price, created_by, created_at, updated_at";
const SHOWTIME_COLUMNS: &str = r#"id, movie_id, "time", available_seats, created_at, updated_at"#;
const BOOKING_COLUMNS: &str =
    "id, user_id, movie_id, showtime_id, seats, status, created_at, updated_at";

// 23505 = PostgreSQL unique violation
fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

fn labels(seats: &[SeatLabel]) -> Vec<String> {
    seats.iter().map(ToString::to_string).collect()
}

#[async_trait]
impl UserRepository for Database {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("email {} is already registered", user.email))
                } else {
                    AppError::Store(e)
                }
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl MovieRepository for Database {
    async fn create(&self, movie: &Movie) -> Result<Movie, AppError> {
        let sql = format!(
            "INSERT INTO movies (id, title, description, duration, genre, poster, ticket_price, created_by, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {MOVIE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Movie>(&sql)
            .bind(movie.id)
            .bind(&movie.title)
            .bind(&movie.description)
            .bind(movie.duration)
            .bind(&movie.genre)
            .bind(&movie.poster)
            .bind(movie.ticket_price)
            .bind(movie.created_by)
            .bind(movie.created_at)
            .bind(movie.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, AppError> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        Ok(sqlx::query_as::<_, Movie>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list(&self) -> Result<Vec<Movie>, AppError> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Movie>(&sql).fetch_all(&self.pool).await?)
    }

    async fn update(&self, movie: &Movie) -> Result<Option<Movie>, AppError> {
        let sql = format!(
            "UPDATE movies
             SET title = $2, description = $3, duration = $4, genre = $5,
                 poster = $6, ticket_price = $7, updated_at = $8
             WHERE id = $1
             RETURNING {MOVIE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Movie>(&sql)
            .bind(movie.id)
            .bind(&movie.title)
            .bind(&movie.description)
            .bind(movie.duration)
            .bind(&movie.genre)
            .bind(&movie.poster)
            .bind(movie.ticket_price)
            .bind(movie.updated_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ShowtimeRepository for Database {
    async fn create(&self, showtime: &Showtime) -> Result<Showtime, AppError> {
        let sql = format!(
            r#"INSERT INTO showtimes (id, movie_id, "time", available_seats, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {SHOWTIME_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Showtime>(&sql)
            .bind(showtime.id)
            .bind(showtime.movie_id)
            .bind(showtime.time)
            .bind(&showtime.available_seats)
            .bind(showtime.created_at)
            .bind(showtime.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Showtime>, AppError> {
        let sql = format!("SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1");
        Ok(sqlx::query_as::<_, Showtime>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_by_movie(&self, movie_id: Uuid) -> Result<Vec<Showtime>, AppError> {
        let sql = format!(
            r#"SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE movie_id = $1 ORDER BY "time""#
        );
        Ok(sqlx::query_as::<_, Showtime>(&sql).bind(movie_id).fetch_all(&self.pool).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM showtimes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM showtimes WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM showtimes")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn reserve_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Showtime, AppError> {
        let requested = labels(seats);

        // The containment predicate is re-checked against the locked row, so
        // two requests for the same seat cannot both pass.
        let sql = format!(
            r#"UPDATE showtimes
               SET available_seats = ARRAY(
                       SELECT seat
                       FROM unnest(available_seats) WITH ORDINALITY AS t(seat, pos)
                       WHERE seat <> ALL($2::text[])
                       ORDER BY pos),
                   updated_at = NOW()
               WHERE id = $1 AND available_seats @> $2::text[]
               RETURNING {SHOWTIME_COLUMNS}"#
        );
        let updated = sqlx::query_as::<_, Showtime>(&sql)
            .bind(id)
            .bind(&requested)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(showtime) = updated {
            return Ok(showtime);
        }

        let current = ShowtimeRepository::find_by_id(self, id)
            .await?
            .ok_or(AppError::NotFound("Showtime"))?;
        let pool = current.pool();
        let taken = seats
            .iter()
            .find(|seat| !pool.contains(seat))
            .or_else(|| seats.first())
            .map(ToString::to_string)
            .unwrap_or_default();
        Err(AppError::SeatUnavailable(taken))
    }

    async fn release_seats(&self, id: Uuid, seats: &[SeatLabel]) -> Result<Option<Showtime>, AppError> {
        let sql = format!(
            r#"UPDATE showtimes
               SET available_seats = ARRAY(
                       SELECT seat FROM (
                           SELECT unnest(available_seats) AS seat
                           UNION
                           SELECT unnest($2::text[])
                       ) merged
                       ORDER BY left(seat, 1), substring(seat FROM 2)::int),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {SHOWTIME_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Showtime>(&sql)
            .bind(id)
            .bind(labels(seats))
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl BookingRepository for Database {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let sql = format!(
            "INSERT INTO bookings (id, user_id, movie_id, showtime_id, seats, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {BOOKING_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.id)
            .bind(booking.user_id)
            .bind(booking.movie_id)
            .bind(booking.showtime_id)
            .bind(&booking.seats)
            .bind(booking.status)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        Ok(sqlx::query_as::<_, Booking>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Booking>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn mark_cancelled(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let sql = format!(
            "UPDATE bookings
             SET status = 'cancelled', updated_at = NOW()
             WHERE id = $1 AND status = 'confirmed'
             RETURNING {BOOKING_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Booking>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn restore_confirmed(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let sql = format!(
            "UPDATE bookings
             SET status = 'confirmed', updated_at = NOW()
             WHERE id = $1 AND status = 'cancelled'
             RETURNING {BOOKING_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Booking>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn delete_by_movie(&self, movie_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_by_status(&self, status: BookingStatus) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?)
    }
}
