//! Storage trait definitions for the domain layer.
//!
//! A single generic [`Store`] covers every record variant. The PostgreSQL
//! implementation lives in `crate::infrastructure::persistence`, and a
//! `mockall` mock is generated for unit tests.

pub mod store;

pub use store::Store;

#[cfg(test)]
pub use store::MockStore;
