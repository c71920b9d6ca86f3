use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

// Top-level settings container
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub admin: AdminSeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// Allowed origins outside development.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
    /// Run against the in-process store instead of Postgres.
    pub in_memory: bool,
}

// Redis is optional: without a url the cache is disabled
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub ttl_seconds: u64,
    /// Lifetime of cached seat pools. Kept short since a read can race a
    /// booking and write back a pool the booking already invalidated.
    pub seat_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub service_url: Option<String>,
    pub token: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub name: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Layers defaults, `config/cinema.toml`, `CINEMA_*` variables and the
    /// conventional flat variables (`DATABASE_URL`, `PORT`, ...), in that order.
    pub fn load() -> Result<Self, ConfigError> {
        config::Config::builder()
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 5000)?
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "cinema_booking=debug,tower_http=debug")?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.pool_size", 20)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.in_memory", false)?
            .set_default("redis.ttl_seconds", 300)?
            .set_default("redis.seat_ttl_seconds", 5)?
            .set_default("jwt.expires_in_hours", 24)?
            .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST)?
            .set_default("mail.from", "bookMyMovie <no-reply@bookmymovie.local>")?
            .set_default("admin.name", "Administrator")?
            .add_source(File::with_name("config/cinema").required(false))
            .add_source(
                Environment::with_prefix("CINEMA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("app.cors_origins"),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", env::var("REDIS_URL").ok())?
            .set_override_option("jwt.secret", env::var("JWT_SECRET").ok())?
            .set_override_option("app.port", env::var("PORT").ok())?
            .set_override_option("app.rust_log", env::var("RUST_LOG").ok())?
            .set_override_option("mail.service_url", env::var("MAIL_SERVICE_URL").ok())?
            .set_override_option("mail.token", env::var("MAIL_SERVICE_TOKEN").ok())?
            .set_override_option("admin.email", env::var("ADMIN_EMAIL").ok())?
            .set_override_option("admin.password", env::var("ADMIN_PASSWORD").ok())?
            .set_override_option(
                "app.cors_origins",
                env::var("FRONTEND_URL").ok().map(|urls| {
                    urls.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                }),
            )?
            .build()?
            .try_deserialize()
    }
}
