use crate::cache::CacheService;
use crate::models::{Movie, Showtime};
use uuid::Uuid;

const MOVIES_KEY: &str = "movies:all";

fn showtime_key(id: Uuid) -> String {
    format!("showtime:{}", id)
}

fn movie_showtimes_key(movie_id: Uuid) -> String {
    format!("movie:{}:showtimes", movie_id)
}

impl CacheService {
    /// Showtime entries carry seat pools, so they never outlive the seat TTL.
    fn seat_pool_ttl(&self) -> u64 {
        self.seat_ttl_seconds.min(self.ttl_seconds)
    }

    pub async fn get_movies(&self) -> Option<Vec<Movie>> {
        self.get_json(MOVIES_KEY).await
    }

    pub async fn cache_movies(&self, movies: &[Movie]) {
        self.set_json(MOVIES_KEY, movies, self.ttl_seconds).await
    }

    pub async fn invalidate_movies(&self) {
        self.invalidate(MOVIES_KEY).await
    }

    pub async fn get_showtime(&self, id: Uuid) -> Option<Showtime> {
        self.get_json(&showtime_key(id)).await
    }

    pub async fn cache_showtime(&self, showtime: &Showtime) {
        self.set_json(&showtime_key(showtime.id), showtime, self.seat_pool_ttl()).await
    }

    pub async fn get_movie_showtimes(&self, movie_id: Uuid) -> Option<Vec<Showtime>> {
        self.get_json(&movie_showtimes_key(movie_id)).await
    }

    pub async fn cache_movie_showtimes(&self, movie_id: Uuid, showtimes: &[Showtime]) {
        self.set_json(&movie_showtimes_key(movie_id), showtimes, self.seat_pool_ttl())
            .await
    }

    /// Drops the seat pool snapshot of one showtime and its movie's listing.
    pub async fn invalidate_showtime(&self, showtime_id: Uuid, movie_id: Uuid) {
        self.invalidate(&showtime_key(showtime_id)).await;
        self.invalidate(&movie_showtimes_key(movie_id)).await;
    }

    pub async fn invalidate_movie(&self, movie_id: Uuid, showtime_ids: &[Uuid]) {
        self.invalidate(MOVIES_KEY).await;
        self.invalidate(&movie_showtimes_key(movie_id)).await;
        for id in showtime_ids {
            self.invalidate(&showtime_key(*id)).await;
        }
    }
}
