use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::{AdminSeedConfig, Config};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{Role, User};
use crate::repositories::UserRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, config: &Config) -> Self {
        let secret = config.jwt.secret.as_bytes();
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expires_in_hours: config.jwt.expires_in_hours,
            bcrypt_cost: config.auth.bcrypt_cost,
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self.create_account(name, email, password, Role::User).await?;
        info!("Registered user {}", user.id);
        self.session_for(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self.authenticate(email, password).await?;
        self.session_for(user)
    }

    /// Same as [`login`](Self::login) but only admins get a token.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self.authenticate(email, password).await?;
        if !user.is_admin() {
            return Err(AppError::Unauthorized("admin access required".into()));
        }
        self.session_for(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(self.expires_in_hours)).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("JWT encoding failed: {}", e);
            AppError::Internal("token encoding failed".into())
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthenticated)
    }

    /// Creates the configured admin account unless one with that email exists.
    pub async fn ensure_admin(&self, seed: &AdminSeedConfig) -> Result<Option<User>, AppError> {
        let (Some(email), Some(password)) = (&seed.email, &seed.password) else {
            return Ok(None);
        };
        if self.users.find_by_email(&normalize_email(email)).await?.is_some() {
            return Ok(None);
        }

        let admin = self.create_account(&seed.name, email, password, Role::Admin).await?;
        info!("Seeded admin account {}", admin.email);
        Ok(Some(admin))
    }

    async fn create_account(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User, AppError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("email {} is already registered", email)));
        }

        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        self.users.create(&User::new(name, &email, password_hash, role)).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::Unauthenticated)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        if !valid {
            return Err(AppError::Unauthenticated);
        }
        Ok(user)
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AppError> {
        Ok(AuthSession {
            token: self.issue_token(&user)?,
            user,
        })
    }
}
