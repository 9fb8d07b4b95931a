//! HTTP middleware: session handling and request tracing.

pub mod session;
pub mod tracing;
