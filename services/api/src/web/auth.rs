//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_companion_core::auth::Auth;
use tracing::info;
use utoipa::ToSchema;

use crate::web::{
    errors::{error_response, require_user, HandlerError},
    state::{AppState, TabState},
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub username: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User created and signed in", body = AuthResponse),
        (status = 400, description = "Password too short"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let auth = Auth::new(state.record_store(&tab));
    let username = auth
        .sign_up(&req.username, &req.password)
        .await
        .map_err(error_response)?;

    tab.reset_conversations().await;
    info!("User '{}' signed up on tab {}", username, tab.id);
    Ok((StatusCode::CREATED, Json(AuthResponse { username })))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let auth = Auth::new(state.record_store(&tab));
    let username = auth
        .login(&req.username, &req.password)
        .await
        .map_err(error_response)?;

    // A different user may be signing in on this tab.
    tab.reset_conversations().await;
    info!("User '{}' logged in on tab {}", username, tab.id);
    Ok(Json(AuthResponse { username }))
}

/// POST /auth/logout - Clear the tab's session and client state
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
) -> Result<impl IntoResponse, HandlerError> {
    Auth::new(state.record_store(&tab))
        .logout()
        .await
        .map_err(error_response)?;
    tab.reset_conversations().await;
    state.tabs.remove(&tab.id);
    info!("Tab {} logged out", tab.id);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - The user signed in on this tab
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(tab): Extension<Arc<TabState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let username = require_user(&state.record_store(&tab)).await?;
    Ok(Json(AuthResponse { username }))
}
