//! Flows spanning links and their short links.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::record_service::{LinkService, ShortLinkService};
use crate::domain::entities::{Link, ShortLink};
use crate::domain::errors::RepositoryError;
use crate::domain::repositories::Store;
use crate::error::AppError;
use crate::infrastructure::persistence::PgStore;
use crate::utils::token_generator::TokenGenerator;
use crate::utils::url_normalizer::{UrlNormalizationError, normalize_url};

#[derive(Debug, thiserror::Error)]
pub enum ShortenError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlNormalizationError),

    #[error("link behind `{token}` is inactive")]
    Inactive { token: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ShortenError> for AppError {
    fn from(e: ShortenError) -> Self {
        match e {
            ShortenError::InvalidUrl(reason) => AppError::bad_request(
                "Invalid URL format",
                json!({ "reason": reason.to_string() }),
            ),
            ShortenError::Inactive { token } => {
                AppError::not_found("Link not found", json!({ "token": token }))
            }
            ShortenError::Repository(e) => e.into(),
        }
    }
}

/// A freshly shortened link.
#[derive(Debug, Clone, Serialize)]
pub struct Shortened {
    pub link: Link,
    pub short_link: ShortLink,
}

/// A link together with its token, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkWithToken {
    #[serde(flatten)]
    pub link: Link,
    pub token: Option<String>,
}

pub struct Shortener<LS = PgStore<Link>, SS = PgStore<ShortLink>>
where
    LS: Store<Link>,
    SS: Store<ShortLink>,
{
    links: Arc<LinkService<LS>>,
    short_links: Arc<ShortLinkService<SS>>,
    tokens: Arc<TokenGenerator>,
}

impl<LS: Store<Link>, SS: Store<ShortLink>> Shortener<LS, SS> {
    pub fn new(
        links: Arc<LinkService<LS>>,
        short_links: Arc<ShortLinkService<SS>>,
        tokens: Arc<TokenGenerator>,
    ) -> Self {
        Self {
            links,
            short_links,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenGenerator {
        &self.tokens
    }

    /// Stores a new link and derives its token from the assigned id.
    ///
    /// The link and the short link are written by two statements. If the
    /// second one fails the link stays behind without a token.
    ///
    /// # Errors
    ///
    /// - [`ShortenError::InvalidUrl`] if the target is not an http(s) URL
    /// - [`ShortenError::Repository`] if either insert fails, e.g. the owner
    ///   does not exist
    pub async fn shorten(
        &self,
        long_link: &str,
        owner_id: Option<i64>,
        is_active: bool,
    ) -> Result<Shortened, ShortenError> {
        let long_link = normalize_url(long_link)?;

        let link = self
            .links
            .create(Link::new(long_link, owner_id, is_active))
            .await?;
        let short_link = self.short_links.create_for_link(link.id, &self.tokens).await?;

        tracing::info!(
            link_id = link.id,
            token = %short_link.token,
            "link shortened"
        );

        Ok(Shortened { link, short_link })
    }

    /// Resolves a token and counts the click.
    ///
    /// # Errors
    ///
    /// - [`ShortenError::Repository`] with a not-found source for unknown tokens
    /// - [`ShortenError::Inactive`] if the link is switched off
    pub async fn follow(&self, token: &str) -> Result<Link, ShortenError> {
        let short_link = self.short_links.find_by_token(token).await?;
        let link = self.links.read(short_link.long_link_id).await?;

        if !link.is_active {
            tracing::info!(token, link_id = link.id, "inactive link requested");
            return Err(ShortenError::Inactive {
                token: token.to_string(),
            });
        }

        Ok(self.links.record_click(link.id).await?)
    }

    /// Links owned by a user, newest first, each with its token.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on database errors.
    pub async fn links_of(&self, owner_id: i64) -> Result<Vec<LinkWithToken>, RepositoryError> {
        let mut links = self.links.search("owner_id", owner_id).await?;
        links.sort_by(|a, b| b.id.cmp(&a.id));

        let mut result = Vec::with_capacity(links.len());
        for link in links {
            let token = self
                .short_links
                .find_by_link(link.id)
                .await?
                .map(|short| short.token);
            result.push(LinkWithToken { link, token });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diff::ChangeSet;
    use crate::domain::errors::StoreError;
    use crate::domain::record::FieldValue;
    use crate::domain::repositories::MockStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tokens() -> Arc<TokenGenerator> {
        Arc::new(TokenGenerator::with_default_alphabet("test-salt", 6).unwrap())
    }

    fn shortener(
        links: MockStore<Link>,
        short_links: MockStore<ShortLink>,
    ) -> Shortener<MockStore<Link>, MockStore<ShortLink>> {
        Shortener::new(
            Arc::new(LinkService::<MockStore<Link>>::new(Arc::new(links))),
            Arc::new(ShortLinkService::<MockStore<ShortLink>>::new(Arc::new(short_links))),
            tokens(),
        )
    }

    fn link(id: i64, is_active: bool) -> Link {
        Link {
            id,
            long_link: "https://ya.ru/".to_string(),
            click_counter: 100,
            owner_id: Some(2),
            is_active,
        }
    }

    #[tokio::test]
    async fn test_shorten_normalizes_and_derives_token() {
        let mut links = MockStore::<Link>::new();
        links
            .expect_create()
            .withf(|link| link.long_link == "https://ya.ru/" && link.click_counter == 0)
            .times(1)
            .returning(|_| Ok(11));

        let expected = tokens().encode(11);
        let mut short_links = MockStore::<ShortLink>::new();
        short_links
            .expect_create()
            .withf(|short| short.long_link_id == 11)
            .times(1)
            .returning(|_| Ok(5));

        let shortened = shortener(links, short_links)
            .shorten("  https://ya.ru  ", Some(2), true)
            .await
            .unwrap();

        assert_eq!(shortened.link.id, 11);
        assert_eq!(shortened.short_link.token, expected);
    }

    #[tokio::test]
    async fn test_shorten_rejects_bad_url_before_writing() {
        let mut links = MockStore::<Link>::new();
        links.expect_create().never();
        let mut short_links = MockStore::<ShortLink>::new();
        short_links.expect_create().never();

        let err = shortener(links, short_links)
            .shorten("javascript:alert(1)", None, true)
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_follow_counts_click() {
        let mut short_links = MockStore::<ShortLink>::new();
        short_links
            .expect_search()
            .returning(|_, _| Ok(vec![ShortLink::new("p2z68d", 1)]));

        let reads = Arc::new(AtomicUsize::new(0));
        let mut links = MockStore::<Link>::new();
        links.expect_read().times(3).returning(move |_| {
            // The third read is the re-read after the increment.
            match reads.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Ok(link(1, true)),
                _ => Ok(Link {
                    click_counter: 101,
                    ..link(1, true)
                }),
            }
        });
        links
            .expect_update()
            .withf(|stored, proposed| proposed.click_counter == stored.click_counter + 1)
            .times(1)
            .returning(|stored, proposed| Ok(ChangeSet::of(stored, proposed)));

        let followed = shortener(links, short_links)
            .follow("p2z68d")
            .await
            .unwrap();

        assert_eq!(followed.click_counter, 101);
    }

    #[tokio::test]
    async fn test_follow_inactive_link_is_not_counted() {
        let mut short_links = MockStore::<ShortLink>::new();
        short_links
            .expect_search()
            .returning(|_, _| Ok(vec![ShortLink::new("l8wxrd", 5)]));

        let mut links = MockStore::<Link>::new();
        links.expect_read().times(1).returning(|_| Ok(link(5, false)));
        links.expect_update().never();

        let err = shortener(links, short_links)
            .follow("l8wxrd")
            .await
            .unwrap_err();

        assert!(matches!(err, ShortenError::Inactive { .. }));
        assert_eq!(
            AppError::from(err).status(),
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_follow_unknown_token() {
        let mut short_links = MockStore::<ShortLink>::new();
        short_links.expect_search().returning(|_, _| Ok(vec![]));
        let links = MockStore::<Link>::new();

        let err = shortener(links, short_links)
            .follow("zzzzzz")
            .await
            .unwrap_err();

        match err {
            ShortenError::Repository(e) => assert!(e.is_not_found()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_links_of_newest_first_with_tokens() {
        let mut links = MockStore::<Link>::new();
        links
            .expect_search()
            .withf(|column, value| column == "owner_id" && *value == FieldValue::Int(2))
            .returning(|_, _| Ok(vec![link(1, true), link(10, true)]));

        let mut short_links = MockStore::<ShortLink>::new();
        short_links
            .expect_search()
            .returning(|_, value| match value {
                FieldValue::Int(1) => Ok(vec![ShortLink::new("p2z68d", 1)]),
                _ => Ok(vec![]),
            });

        let found = shortener(links, short_links).links_of(2).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].link.id, 10);
        assert_eq!(found[0].token, None);
        assert_eq!(found[1].token.as_deref(), Some("p2z68d"));
    }

    #[tokio::test]
    async fn test_shorten_with_unknown_owner_is_conflict() {
        let mut links = MockStore::<Link>::new();
        links.expect_create().returning(|_| {
            Err(StoreError::Constraint {
                constraint: Some("links_owner_id_fkey".to_string()),
                source: sqlx::Error::RowNotFound,
            })
        });
        let short_links = MockStore::<ShortLink>::new();

        let err = shortener(links, short_links)
            .shorten("https://ya.ru", Some(404), true)
            .await
            .unwrap_err();

        let app: AppError = err.into();
        assert_eq!(app.status(), axum::http::StatusCode::CONFLICT);
    }
}
