//! Business logic services for the application layer.

pub mod record_service;
pub mod session_service;
pub mod shortener;

pub use record_service::{LinkService, RecordService, ShortLinkService, UserService};
pub use session_service::{CurrentUser, SESSION_COOKIE, SessionService};
pub use shortener::{LinkWithToken, ShortenError, Shortened, Shortener};
