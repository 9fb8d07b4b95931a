//! Infrastructure layer for external integrations.
//!
//! Implements the storage contract of the domain layer on PostgreSQL.
//!
//! # Modules
//!
//! - [`persistence`] - generic PostgreSQL store, update compiler and demo data

pub mod persistence;
