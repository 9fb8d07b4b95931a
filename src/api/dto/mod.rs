//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs derive `validator::Validate`; every success body is wrapped
//! in a [`reply::Reply`].

pub mod health;
pub mod links;
pub mod reply;
pub mod session;
pub mod users;
