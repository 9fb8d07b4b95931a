//! Cookie session middleware.

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::application::services::{CurrentUser, SESSION_COOKIE, SessionService};
use crate::domain::errors::StoreError;
use crate::error::AppError;
use crate::state::AppState;

/// Value of the session cookie, if the request carries one.
fn session_cookie(req: &Request) -> Option<String> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(SESSION_COOKIE), Some(value)) if !value.is_empty() => {
                    Some(value.to_string())
                }
                _ => None,
            }
        })
}

/// Outcome of resolving the session cookie of a request.
enum Session {
    Absent,
    Active(CurrentUser),
    /// Bad signature, or the user was deleted or renamed since login.
    Stale,
}

async fn resolve(st: &AppState, cookie: Option<String>) -> Result<Session, AppError> {
    let Some(cookie) = cookie else {
        return Ok(Session::Absent);
    };

    let Some(claimed) = st.sessions.verify(&cookie) else {
        tracing::debug!("Rejected session cookie with a bad signature");
        return Ok(Session::Stale);
    };

    match st.users.read(claimed.id).await {
        Ok(user) if user.username == claimed.username => Ok(Session::Active(claimed)),
        Ok(_) => {
            tracing::info!(user_id = claimed.id, "Session of a renamed user dropped");
            Ok(Session::Stale)
        }
        Err(e) if matches!(e.source, StoreError::NotFound { .. }) => {
            tracing::info!(user_id = claimed.id, "Session of a deleted user dropped");
            Ok(Session::Stale)
        }
        Err(e) => Err(e.into()),
    }
}

fn clear_cookie(mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&SessionService::clear_cookie()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn unauthorized() -> AppError {
    AppError::unauthorized(
        "Unauthorized",
        json!({ "reason": "Session cookie is missing or invalid" }),
    )
}

/// Resolves the session or builds the rejection. A stale cookie is cleared.
async fn require_session(st: &AppState, cookie: Option<String>) -> Result<CurrentUser, Response> {
    match resolve(st, cookie).await {
        Ok(Session::Active(user)) => Ok(user),
        Ok(Session::Absent) => Err(unauthorized().into_response()),
        Ok(Session::Stale) => Err(clear_cookie(unauthorized().into_response())),
        Err(e) => Err(e.into_response()),
    }
}

/// Attaches the [`CurrentUser`] when a valid session is present.
///
/// Never rejects a request. Handlers read the user with
/// `Option<Extension<CurrentUser>>`. A stale cookie is cleared on the way out.
pub async fn identify(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookie = session_cookie(&req);
    match resolve(&st, cookie).await {
        Ok(Session::Active(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(Session::Absent) => next.run(req).await,
        Ok(Session::Stale) => clear_cookie(next.run(req).await),
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed, continuing anonymously");
            next.run(req).await
        }
    }
}

/// Requires a valid session and attaches the [`CurrentUser`].
///
/// The session must belong to an existing user whose username has not
/// changed since login.
///
/// # Errors
///
/// Responds `401 Unauthorized` if the `session` cookie is missing, its
/// signature does not verify or its user is gone. In the last two cases the
/// cookie is cleared.
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookie = session_cookie(&req);
    match require_session(&st, cookie).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(rejection) => rejection,
    }
}

/// Requires a valid session belonging to the admin.
///
/// # Errors
///
/// Responds like [`layer`] without a valid session and `403 Forbidden` for
/// any other user.
pub async fn admin_layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookie = session_cookie(&req);
    let user = match require_session(&st, cookie).await {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };

    if !user.is_admin {
        tracing::info!(user_id = user.id, "Admin route refused");
        return AppError::forbidden("Forbidden", json!({ "reason": "Admin only" })).into_response();
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}
