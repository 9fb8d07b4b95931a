//! Helpers shared across layers.
//!
//! - [`token_generator`] - deterministic hashid tokens for link ids
//! - [`url_normalizer`] - URL normalization and sanitization

pub mod token_generator;
pub mod url_normalizer;

pub use token_generator::{TokenConfigError, TokenGenerator};
