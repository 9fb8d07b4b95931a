//! Shared state handed to every handler.

use std::sync::Arc;

use sqlx::PgPool;

use crate::application::services::{
    LinkService, SessionService, ShortLinkService, Shortener, UserService,
};
use crate::config::Config;
use crate::infrastructure::persistence::PgStore;
use crate::utils::token_generator::TokenGenerator;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub users: Arc<UserService>,
    pub links: Arc<LinkService>,
    pub short_links: Arc<ShortLinkService>,
    pub shortener: Arc<Shortener>,
    pub sessions: Arc<SessionService>,
    /// Public prefix of short URLs, without a trailing slash.
    pub base_url: String,
    pub default_owner_id: i64,
}

impl AppState {
    /// Wires the PostgreSQL-backed services around one pool.
    pub fn new(
        pool: Arc<PgPool>,
        tokens: TokenGenerator,
        sessions: SessionService,
        base_url: impl Into<String>,
        default_owner_id: i64,
    ) -> Self {
        let users = Arc::new(UserService::new(Arc::new(PgStore::new(pool.clone()))));
        let links = Arc::new(LinkService::new(Arc::new(PgStore::new(pool.clone()))));
        let short_links = Arc::new(ShortLinkService::new(Arc::new(PgStore::new(pool.clone()))));
        let shortener = Arc::new(Shortener::new(
            links.clone(),
            short_links.clone(),
            Arc::new(tokens),
        ));

        Self {
            pool,
            users,
            links,
            short_links,
            shortener,
            sessions: Arc::new(sessions),
            base_url: base_url.into(),
            default_owner_id,
        }
    }

    /// Builds the state from validated configuration.
    ///
    /// # Errors
    ///
    /// Fails if the token generator configuration is invalid.
    pub fn from_config(pool: Arc<PgPool>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            pool,
            config.token_generator()?,
            SessionService::new(&config.session_secret, &config.admin_username),
            &config.base_url,
            config.default_owner_id,
        ))
    }

    /// Full public URL of a token.
    pub fn short_url(&self, token: &str) -> String {
        format!("{}/{}", self.base_url, token)
    }
}
