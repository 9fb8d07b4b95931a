//! Persisted entities.
//!
//! - [`User`] - a registered account
//! - [`Link`] - a long URL with its click counter
//! - [`ShortLink`] - the token that resolves to a link
//!
//! Each entity implements [`crate::domain::record::Record`], which is all the
//! generic store needs to create, read, search, update and delete it.

pub mod link;
pub mod short_link;
pub mod user;

pub use link::Link;
pub use short_link::ShortLink;
pub use user::User;
