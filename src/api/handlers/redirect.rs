//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a token to its link target and counts the click.
///
/// # Endpoint
///
/// `GET /{token}`
///
/// # Response Codes
///
/// - **302 Found** with `Location` set to the stored target
/// - **404 Not Found** for unknown tokens and inactive links
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.shortener.follow(&token).await?;

    tracing::debug!(token, link_id = link.id, clicks = link.click_counter, "Redirect");

    Ok((StatusCode::FOUND, [(header::LOCATION, link.long_link)]))
}
