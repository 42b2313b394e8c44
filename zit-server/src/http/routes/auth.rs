//! Account and token endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use zit_core::auth;
use zit_core::models::{Password, Username};
use zit_core::repos::User;

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

/// Register and login request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Unix seconds
    pub expires_at: i64,
}

#[derive(Serialize)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    pub username: Option<String>,
}

/// POST /auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = Username::new(&req.username)?;
    let password = Password::new(&req.password)?;
    let user = auth::register_user(&state.db, &state.config.auth, &username, &password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/token - exchange username and password for a bearer token
async fn token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = auth::authenticate(&state.db, &req.username, &req.password).await?;
    let issued = auth::issue_access_token(&state.db, &state.config.auth, &user).await?;
    tracing::info!(user_id = user.id, "login");

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer",
        expires_at: issued.expires_at,
    }))
}

/// GET /auth/me
async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

/// GET /auth/whoami - works with or without a token
async fn whoami(MaybeUser(user): MaybeUser) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        authenticated: user.is_some(),
        username: user.map(|u| u.username),
    })
}

/// POST /auth/logout - revoke the token this request was made with
async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<StatusCode, ApiError> {
    auth::revoke_access_token(&state.db, &current.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(token))
        .route("/auth/me", get(me))
        .route("/auth/whoami", get(whoami))
        .route("/auth/logout", post(logout))
}
