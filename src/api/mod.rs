//! REST API layer for HTTP request/response handling.
//!
//! # Modules
//!
//! - [`dto`] - Request and response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Session and tracing middleware
//! - [`routes`] - Route groups by required session
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
