//! Handlers for link endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Map, Value, json};
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, LinkView};
use crate::api::dto::reply::Reply;
use crate::application::services::{CurrentUser, LinkWithToken};
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::url_normalizer::normalize_url;

/// Reads a link and checks that the caller may touch it.
async fn accessible_link(state: &AppState, user: &CurrentUser, id: i64) -> Result<Link, AppError> {
    let link = state.links.read(id).await?;
    if !user.can_access(link.owner_id) {
        tracing::info!(user_id = user.id, link_id = id, "Link access refused");
        return Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "Link belongs to another user" }),
        ));
    }
    Ok(link)
}

/// Shortens a URL.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// { "long_link": "https://ya.ru", "owner_id": 2, "is_active": true }
/// ```
///
/// Only `long_link` is required. Without `owner_id` the link belongs to the
/// session user, or to the configured default owner for anonymous callers.
/// Naming any other owner is reserved to the admin, as for `PATCH`.
///
/// # Response
///
/// `201 Created` with `{"created": "<token>"}`.
///
/// # Errors
///
/// - 400 Bad Request if the URL is not an absolute http(s) URL
/// - 403 Forbidden if a non-admin names another owner
/// - 409 Conflict if the owner does not exist
pub async fn create_link_handler(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<Reply<String>, AppError> {
    payload.validate()?;

    let caller = user.map(|Extension(user)| user);
    let implied_owner = caller
        .as_ref()
        .map_or(state.default_owner_id, |user| user.id);
    let is_admin = caller.as_ref().is_some_and(|user| user.is_admin);

    let owner_id = match payload.owner_id {
        Some(owner_id) if owner_id != implied_owner && !is_admin => {
            tracing::info!(owner_id, implied_owner, "Link owner refused");
            return Err(AppError::forbidden(
                "Forbidden",
                json!({ "reason": "Only the admin can create links for another user" }),
            ));
        }
        Some(owner_id) => owner_id,
        None => implied_owner,
    };

    let shortened = state
        .shortener
        .shorten(&payload.long_link, Some(owner_id), payload.is_active)
        .await?;

    tracing::info!(
        owner_id,
        short_url = %state.short_url(&shortened.short_link.token),
        "Short link created"
    );

    Ok(Reply::Created(shortened.short_link.token))
}

/// Returns a link with its token.
///
/// # Endpoint
///
/// `GET /api/links/{id}`
///
/// # Errors
///
/// - 403 Forbidden if the link belongs to someone else
/// - 404 Not Found if the link does not exist
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Reply<LinkView>, AppError> {
    let link = accessible_link(&state, &user, id).await?;
    let token = state
        .short_links
        .find_by_link(link.id)
        .await?
        .map(|short| short.token);

    Ok(Reply::Read(LinkView::new(
        LinkWithToken { link, token },
        &state.base_url,
    )))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// Accepts any subset of `long_link`, `owner_id` (admin only) and
/// `is_active`. Other keys, including `click_counter`, are ignored.
///
/// # Errors
///
/// - 400 Bad Request for invalid URLs and mistyped values
/// - 403 Forbidden if the link belongs to someone else
/// - 404 Not Found if the link does not exist
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(mut patch): Json<Map<String, Value>>,
) -> Result<Reply<Link>, AppError> {
    accessible_link(&state, &user, id).await?;

    if patch.contains_key("owner_id") && !user.is_admin {
        return Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "Only the admin can change the owner" }),
        ));
    }

    if let Some(Value::String(long_link)) = patch.get("long_link") {
        let normalized = normalize_url(long_link).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;
        patch.insert("long_link".to_string(), Value::String(normalized));
    }

    let link = state.links.update(id, &patch).await?;

    Ok(Reply::Updated(link))
}

/// Deletes a link together with its short link.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Errors
///
/// - 403 Forbidden if the link belongs to someone else
/// - 404 Not Found if the link does not exist
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Reply<Link>, AppError> {
    accessible_link(&state, &user, id).await?;

    let link = state.links.delete(id).await?;

    Ok(Reply::Deleted(link))
}
