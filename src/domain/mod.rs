//! Domain layer: records, their schemas and the storage contract.
//!
//! - [`record`] - the [`record::Record`] trait and typed field values
//! - [`entities`] - users, links and short links
//! - [`diff`] - change sets between a stored and a proposed record
//! - [`errors`] - store and repository errors
//! - [`repositories`] - the generic [`repositories::Store`] trait
//!
//! Nothing here depends on the HTTP layer. The PostgreSQL implementation of
//! the store lives in [`crate::infrastructure::persistence`].

pub mod diff;
pub mod entities;
pub mod errors;
pub mod record;
pub mod repositories;
