//! PostgreSQL persistence.
//!
//! - [`PgStore`] - generic store driven by each record's static schema
//! - [`update_compiler`] - turns a change set into a parameterized `UPDATE`
//! - [`seed`] - demo users, links and short links

pub mod pg_store;
pub mod seed;
pub mod update_compiler;

pub use pg_store::PgStore;
pub use seed::seed_demo_data;
pub use update_compiler::{CompiledUpdate, compile_update};
