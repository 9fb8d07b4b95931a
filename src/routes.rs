//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET  /health`   - Database check (public)
//! - `GET  /{token}`  - Short link redirect (public)
//! - public, session and admin API groups from [`crate::api::routes`]
//!
//! # Middleware
//!
//! - **Tracing** - request spans for every route
//! - **Session** - identifies the caller on public routes, requires a
//!   session or the admin on the others
//! - **Path normalization** - trailing slashes are trimmed

use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{session, tracing};
use crate::api::routes::{admin_routes, public_routes, session_routes};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with all routes and middleware, without path
/// normalization.
pub fn router(state: AppState) -> Router {
    let public = public_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::identify,
    ));

    let with_session = session_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::layer,
    ));

    let admin = admin_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        session::admin_layer,
    ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/{token}", get(redirect_handler))
        .merge(public)
        .merge(with_session)
        .merge(admin)
        .with_state(state)
        .layer(tracing::layer())
}

/// [`router`] wrapped so that `/api/links/` and `/api/links` are the same route.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
