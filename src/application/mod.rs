//! Application layer services.
//!
//! Services sit between the HTTP handlers and the generic store. They add
//! operation context to storage errors, log outcomes and implement the flows
//! that touch more than one entity.
//!
//! # Available Services
//!
//! - [`services::record_service::RecordService`] - per-entity repositories
//!   (users, links, short links)
//! - [`services::shortener::Shortener`] - shortening and following links
//! - [`services::session_service::SessionService`] - signed session cookies

pub mod services;
