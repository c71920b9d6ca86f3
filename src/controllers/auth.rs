use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    controllers::extract::ValidJson,
    error::AppError,
    middleware::AuthUser,
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let session = state.auth.register(&req.name, &req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let session = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(session))
}

// POST /api/auth/admin/login
async fn admin_login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let session = state.auth.admin_login(&req.email, &req.password).await?;
    Ok(Json(session))
}

// GET /api/auth/me
async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth.profile(user.id).await?;
    Ok(Json(profile))
}
