//! Read-through cache for catalog reads. Redis is advisory: every failure is
//! logged and the caller falls back to the store.

use crate::config::RedisConfig;
use crate::redis_client::RedisClient;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

pub mod catalog;

#[derive(Clone)]
pub struct CacheService {
    redis: Option<RedisClient>,
    ttl_seconds: u64,
    seat_ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, config: &RedisConfig) -> Self {
        Self {
            redis: Some(redis),
            ttl_seconds: config.ttl_seconds,
            seat_ttl_seconds: config.seat_ttl_seconds,
        }
    }

    /// Cache that never hits. Used when no Redis url is configured.
    pub fn disabled() -> Self {
        Self {
            redis: None,
            ttl_seconds: 0,
            seat_ttl_seconds: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.conn.clone();

        let data: Option<String> = match conn.get(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Cache read failed for {}: {:?}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Cache entry {} is not valid JSON: {}", key, e);
                None
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        let mut conn = redis.conn.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(key, data, ttl_seconds).await {
            warn!("Cache write failed for {}: {:?}", key, e);
        }
    }

    async fn invalidate(&self, key: &str) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let mut conn = redis.conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!("Cache invalidation failed for {}: {:?}", key, e);
        } else {
            debug!("Invalidated cache key {}", key);
        }
    }
}
