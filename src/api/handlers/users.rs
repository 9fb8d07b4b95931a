//! Handlers for user endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::LinkView;
use crate::api::dto::reply::Reply;
use crate::api::dto::users::{CreateUserRequest, UpdateUserRequest};
use crate::application::services::CurrentUser;
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

fn ensure_self_or_admin(user: &CurrentUser, id: i64) -> Result<(), AppError> {
    if user.can_access(Some(id)) {
        Ok(())
    } else {
        tracing::info!(user_id = user.id, target_id = id, "User access refused");
        Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "Only the user or the admin may do this" }),
        ))
    }
}

/// Registers a user.
///
/// # Endpoint
///
/// `POST /api/users`
///
/// # Errors
///
/// - 400 Bad Request if validation fails
/// - 409 Conflict if the username is taken
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Reply<User>, AppError> {
    payload.validate()?;

    let user = state.users.create(User::from(payload)).await?;
    let user = state.users.read(user.id).await?;

    Ok(Reply::Created(user))
}

/// `GET /api/users/{id}`, for the user themself or the admin.
pub async fn get_user_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Reply<User>, AppError> {
    ensure_self_or_admin(&user, id)?;

    Ok(Reply::Read(state.users.read(id).await?))
}

/// Partially updates a user.
///
/// # Endpoint
///
/// `PATCH /api/users/{id}`
///
/// A new `password` is hashed by the database. Only the admin may change
/// `user_status`. A user renaming themself gets a fresh session cookie, since
/// sessions are bound to the username.
pub async fn update_user_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Response, AppError> {
    ensure_self_or_admin(&user, id)?;
    payload.validate()?;

    if payload.user_status.is_some() && !user.is_admin {
        return Err(AppError::forbidden(
            "Forbidden",
            json!({ "reason": "Only the admin can change user_status" }),
        ));
    }

    let updated = state.users.update(id, &payload.into_patch()).await?;

    if user.id == id && updated.username != user.username {
        let cookie = state.sessions.set_cookie(&updated);
        return Ok(([(header::SET_COOKIE, cookie)], Reply::Updated(updated)).into_response());
    }

    Ok(Reply::Updated(updated).into_response())
}

/// Links of a user, newest first.
///
/// # Endpoint
///
/// `GET /api/users/{id}/links`
pub async fn user_links_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Reply<Vec<LinkView>>, AppError> {
    ensure_self_or_admin(&user, id)?;

    let links = state
        .shortener
        .links_of(id)
        .await?
        .into_iter()
        .map(|item| LinkView::new(item, &state.base_url))
        .collect();

    Ok(Reply::Found(links))
}

/// All users. Admin only.
///
/// # Endpoint
///
/// `GET /api/users`
pub async fn list_users_handler(State(state): State<AppState>) -> Result<Reply<Vec<User>>, AppError> {
    Ok(Reply::Found(state.users.list().await?))
}

/// Deletes a user. Their links are kept without an owner. Admin only.
///
/// # Endpoint
///
/// `DELETE /api/users/{id}`
pub async fn delete_user_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
) -> Result<Reply<User>, AppError> {
    if admin.id == id {
        return Err(AppError::conflict(
            "The admin cannot delete their own account",
            json!({ "id": id }),
        ));
    }

    Ok(Reply::Deleted(state.users.delete(id).await?))
}
