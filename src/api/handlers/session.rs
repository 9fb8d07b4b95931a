//! Login and logout.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::Value;
use validator::Validate;

use crate::api::dto::reply::Reply;
use crate::api::dto::session::LoginRequest;
use crate::application::services::SessionService;
use crate::error::AppError;
use crate::state::AppState;

/// Checks credentials and sets the session cookie.
///
/// # Endpoint
///
/// `POST /login`
///
/// # Errors
///
/// Returns 401 Unauthorized for unknown users and wrong passwords alike.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .check(&payload.username, &payload.password)
        .await
        .ok_or_else(|| AppError::unauthorized("Bad login/password", Value::Null))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        [(header::SET_COOKIE, state.sessions.set_cookie(&user))],
        Reply::Read(user),
    ))
}

/// Clears the session cookie.
///
/// # Endpoint
///
/// `POST /logout`
pub async fn logout_handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, SessionService::clear_cookie())],
    )
}
