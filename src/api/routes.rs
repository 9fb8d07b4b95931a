//! API route configuration.
//!
//! Routes are grouped by the session they need. The groups are merged and
//! layered in [`crate::routes::app_router`].

use crate::api::handlers::{
    create_link_handler, create_user_handler, delete_link_handler, delete_user_handler,
    get_link_handler, get_user_handler, list_users_handler, login_handler, logout_handler,
    update_link_handler, update_user_handler, user_links_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Routes open to anonymous callers.
///
/// - `POST /login`       - Start a session
/// - `POST /logout`      - End the session
/// - `POST /api/users`   - Register
/// - `POST /api/links`   - Shorten a URL
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/api/users", post(create_user_handler))
        .route("/api/links", post(create_link_handler))
}

/// Routes for any logged-in user. Ownership is checked per handler.
///
/// - `GET|PATCH|DELETE /api/links/{id}`
/// - `GET|PATCH        /api/users/{id}`
/// - `GET              /api/users/{id}/links`
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route(
            "/api/users/{id}",
            get(get_user_handler).patch(update_user_handler),
        )
        .route("/api/users/{id}/links", get(user_links_handler))
}

/// Routes for the admin only.
///
/// - `GET    /api/users`      - List users
/// - `DELETE /api/users/{id}` - Delete a user
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users_handler))
        .route("/api/users/{id}", delete(delete_user_handler))
}
