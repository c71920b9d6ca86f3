#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name},
    Fake,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

use cinema_booking::{
    build_router,
    cache::CacheService,
    config::{
        AdminSeedConfig, AppConfig, AuthConfig, Config, DatabaseConfig, JwtConfig, MailConfig,
        RedisConfig,
    },
    error::AppError,
    repositories::Repositories,
    services::notification::{BookingConfirmation, Notifier},
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@cinema.test";
pub const ADMIN_PASSWORD: &str = "admin-secret";

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<BookingConfirmation>>,
    notify: Notify,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<BookingConfirmation> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits until at least `count` confirmations were delivered.
    pub async fn wait_for(&self, count: usize) -> Vec<BookingConfirmation> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            {
                let sent = self.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            if tokio::time::timeout_at(deadline, self.notify.notified()).await.is_err() {
                panic!("expected {} confirmation(s), got {}", count, self.sent().len());
            }
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_booking_confirmation(&self, message: &BookingConfirmation) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message.clone());
        self.notify.notify_one();
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_booking_confirmation(&self, _message: &BookingConfirmation) -> Result<(), AppError> {
        Err(AppError::Internal("smtp down".into()))
    }
}

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            rust_log: "cinema_booking=debug".into(),
            cors_origins: vec!["http://localhost:5173".into()],
        },
        database: DatabaseConfig {
            url: None,
            pool_size: 1,
            acquire_timeout_secs: 5,
            in_memory: true,
        },
        redis: RedisConfig {
            url: None,
            ttl_seconds: 60,
            seat_ttl_seconds: 2,
        },
        jwt: JwtConfig {
            secret: "test-secret".into(),
            expires_in_hours: 1,
        },
        auth: AuthConfig { bcrypt_cost: 4 },
        mail: MailConfig {
            service_url: None,
            token: None,
            from: "test <noreply@cinema.test>".into(),
        },
        admin: AdminSeedConfig {
            name: "Admin".into(),
            email: Some(ADMIN_EMAIL.into()),
            password: Some(ADMIN_PASSWORD.into()),
        },
    }
}

pub struct Session {
    pub id: Uuid,
    pub token: String,
    pub email: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub repos: Repositories,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_notifier(Arc::new(RecordingNotifier::default())).await
    }

    pub async fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let config = test_config();
        let repos = Repositories::in_memory();
        let state = AppState::new(config.clone(), repos.clone(), CacheService::disabled(), notifier);
        state.auth.ensure_admin(&config.admin).await.unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            repos,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn register_user(&self) -> Session {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        let email = format!("{}.{}", Uuid::new_v4().simple(), email);

        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "hunter22" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        Session {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
        }
    }

    pub async fn admin(&self) -> Session {
        let (status, body) = self
            .post(
                "/api/auth/admin/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");

        Session {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
            email: ADMIN_EMAIL.to_string(),
        }
    }

    pub async fn create_movie(&self, admin: &Session, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/movies",
                Some(&admin.token),
                json!({
                    "title": title,
                    "description": "A film",
                    "duration": 120,
                    "genre": "Drama",
                    "poster": "https://img.test/poster.jpg",
                    "ticketPrice": 12.5
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create movie failed: {body}");
        body
    }

    pub async fn create_showtime(&self, admin: &Session, movie_id: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/admin/showtimes",
                Some(&admin.token),
                json!({ "movieId": movie_id, "time": "2030-06-01T19:30:00Z" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create showtime failed: {body}");
        body
    }

    /// Movie id and showtime id of a fresh screening.
    pub async fn screening(&self) -> (String, String) {
        let admin = self.admin().await;
        let movie = self.create_movie(&admin, "Alien").await;
        let movie_id = movie["id"].as_str().unwrap().to_string();
        let showtime = self.create_showtime(&admin, &movie_id).await;
        (movie_id, showtime["id"].as_str().unwrap().to_string())
    }

    pub async fn book(&self, user: &Session, movie_id: &str, showtime_id: &str, seats: Value) -> (StatusCode, Value) {
        self.post(
            "/api/bookings",
            Some(&user.token),
            json!({ "movieId": movie_id, "showtimeId": showtime_id, "seats": seats }),
        )
        .await
    }

    pub async fn available_seats(&self, showtime_id: &str) -> Vec<String> {
        let (status, body) = self.get(&format!("/api/showtimes/{}", showtime_id), None).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(body["availableSeats"].clone()).unwrap()
    }
}
