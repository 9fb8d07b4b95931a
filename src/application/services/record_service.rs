//! Per-entity repositories built on the generic store.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::entities::{Link, ShortLink, User};
use crate::domain::errors::{RepositoryError, StoreError};
use crate::domain::record::{FieldValue, Record};
use crate::domain::repositories::Store;
use crate::infrastructure::persistence::PgStore;
use crate::utils::token_generator::TokenGenerator;

/// Repository for one record variant.
///
/// Adds id write-back on create, read-before-update and read-before-delete on
/// top of a [`Store`]. Every failure is wrapped with the operation and id and
/// logged before it is returned.
///
/// Read, update and re-read are separate statements. A concurrent writer can
/// slip in between them and its change to the same column is lost.
pub struct RecordService<R: Record, S: Store<R>> {
    store: Arc<S>,
    _record: PhantomData<fn() -> R>,
}

pub type UserService<S = PgStore<User>> = RecordService<User, S>;
pub type LinkService<S = PgStore<Link>> = RecordService<Link, S>;
pub type ShortLinkService<S = PgStore<ShortLink>> = RecordService<ShortLink, S>;

impl<R: Record, S: Store<R>> RecordService<R, S> {
    /// Creates a new repository over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn fail(operation: &'static str, id: Option<i64>, source: StoreError) -> RepositoryError {
        let err = RepositoryError::new(R::SCHEMA.kind, operation, id, source);
        if err.is_not_found() {
            tracing::warn!(entity = %err.entity, operation, id, "{err}");
        } else {
            tracing::error!(entity = %err.entity, operation, id, "{err}");
        }
        err
    }

    /// Persists a new record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] (wrapped) on duplicates.
    pub async fn create(&self, mut record: R) -> Result<R, RepositoryError> {
        let id = self
            .store
            .create(&record)
            .await
            .map_err(|e| Self::fail("create", None, e))?;

        record.set_id(id);
        tracing::info!(entity = %R::SCHEMA.kind, id, "record created");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] (wrapped) if no record has this id.
    pub async fn read(&self, id: i64) -> Result<R, RepositoryError> {
        self.store
            .read(id)
            .await
            .map_err(|e| Self::fail("read", Some(id), e))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::UnknownColumn`] (wrapped) if `column` is not searchable.
    pub async fn search(
        &self,
        column: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<R>, RepositoryError> {
        self.store
            .search(column, value.into())
            .await
            .map_err(|e| Self::fail("search", None, e))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Database`] (wrapped) on database errors.
    pub async fn list(&self) -> Result<Vec<R>, RepositoryError> {
        self.store
            .list()
            .await
            .map_err(|e| Self::fail("list", None, e))
    }

    /// Applies a sparse patch to the stored record and returns the fresh row.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the record does not exist
    /// - [`StoreError::InvalidPatch`] if a patched value has the wrong type
    /// - [`StoreError::RowCountMismatch`] if the row vanished meanwhile
    pub async fn update(&self, id: i64, patch: &Map<String, Value>) -> Result<R, RepositoryError> {
        let stored = self
            .store
            .read(id)
            .await
            .map_err(|e| Self::fail("update", Some(id), e))?;

        let mut proposed = stored.clone();
        proposed
            .apply(patch)
            .map_err(|e| Self::fail("update", Some(id), StoreError::InvalidPatch(e)))?;

        self.save(&stored, &proposed).await
    }

    /// Writes the difference between `stored` and `proposed` and re-reads.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`] minus the patch decoding.
    pub async fn save(&self, stored: &R, proposed: &R) -> Result<R, RepositoryError> {
        let id = stored.id();
        let changes = self
            .store
            .update(stored, proposed)
            .await
            .map_err(|e| Self::fail("update", Some(id), e))?;

        if !changes.is_empty() {
            tracing::info!(entity = %R::SCHEMA.kind, id, %changes, "record updated");
        }

        self.store
            .read(id)
            .await
            .map_err(|e| Self::fail("update", Some(id), e))
    }

    /// Deletes a record and returns what it held.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the record does not exist
    /// - [`StoreError::RowCountMismatch`] if it vanished before the delete ran
    pub async fn delete(&self, id: i64) -> Result<R, RepositoryError> {
        let record = self
            .store
            .read(id)
            .await
            .map_err(|e| Self::fail("delete", Some(id), e))?;

        self.store
            .delete(id)
            .await
            .map_err(|e| Self::fail("delete", Some(id), e))?;

        tracing::info!(entity = %R::SCHEMA.kind, id, "record deleted");
        Ok(record)
    }
}

impl<S: Store<User>> RecordService<User, S> {
    /// Verifies credentials. Any failure reads as "not authenticated".
    pub async fn check(&self, username: &str, password: &str) -> Option<User> {
        let found = self.store.check(&User::new(username, password)).await;
        if found.is_none() {
            tracing::info!(username, "credential check failed");
        }
        found
    }

    /// # Errors
    ///
    /// Returns a wrapped [`StoreError`] on database errors.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.search("username", username).await?.into_iter().next())
    }
}

impl<S: Store<Link>> RecordService<Link, S> {
    /// Increments the click counter of a link by one.
    ///
    /// Two concurrent clicks may both read the same counter and record a
    /// single increment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    pub async fn record_click(&self, id: i64) -> Result<Link, RepositoryError> {
        let stored = self
            .store
            .read(id)
            .await
            .map_err(|e| Self::fail("count click on", Some(id), e))?;

        let mut proposed = stored.clone();
        proposed.click_counter += 1;

        self.save(&stored, &proposed).await
    }
}

impl<S: Store<ShortLink>> RecordService<ShortLink, S> {
    /// Derives the token for a link and persists the short link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] (wrapped) if the link already has a
    /// short link or the link does not exist.
    pub async fn create_for_link(
        &self,
        link_id: i64,
        tokens: &TokenGenerator,
    ) -> Result<ShortLink, RepositoryError> {
        // Identity columns are always positive.
        let token = tokens.encode(link_id.unsigned_abs());
        self.create(ShortLink::new(token, link_id)).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown token and
    /// [`StoreError::MultipleFound`] if the token is not unique.
    pub async fn find_by_token(&self, token: &str) -> Result<ShortLink, RepositoryError> {
        let mut found = self
            .store
            .search("token", token.into())
            .await
            .map_err(|e| Self::fail("find", None, e))?;

        match found.len() {
            0 => Err(Self::fail(
                "find",
                None,
                StoreError::NotFound {
                    kind: ShortLink::SCHEMA.kind,
                },
            )),
            1 => Ok(found.remove(0)),
            _ => Err(Self::fail(
                "find",
                None,
                StoreError::MultipleFound {
                    kind: ShortLink::SCHEMA.kind,
                },
            )),
        }
    }

    /// # Errors
    ///
    /// Returns a wrapped [`StoreError`] on database errors.
    pub async fn find_by_link(&self, link_id: i64) -> Result<Option<ShortLink>, RepositoryError> {
        Ok(self
            .search("long_link_id", link_id)
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diff::ChangeSet;
    use crate::domain::record::RecordKind;
    use crate::domain::repositories::MockStore;
    use mockall::predicate::eq;
    use serde_json::json;

    fn stored_link() -> Link {
        Link {
            id: 1,
            long_link: "https://ya.ru".to_string(),
            click_counter: 100,
            owner_id: Some(2),
            is_active: true,
        }
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_writes_back_id() {
        let mut store = MockStore::<User>::new();
        store.expect_create().times(1).returning(|_| Ok(7));

        let service = UserService::<MockStore<User>>::new(Arc::new(store));
        let user = service.create(User::new("iivanov", "ivantest")).await.unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.username, "iivanov");
    }

    #[tokio::test]
    async fn test_create_wraps_constraint_error() {
        let mut store = MockStore::<User>::new();
        store.expect_create().times(1).returning(|_| {
            Err(StoreError::Constraint {
                constraint: Some("users_username_key".to_string()),
                source: sqlx::Error::RowNotFound,
            })
        });

        let service = UserService::<MockStore<User>>::new(Arc::new(store));
        let err = service.create(User::new("admin", "x")).await.unwrap_err();

        assert_eq!(err.entity, RecordKind::User);
        assert_eq!(err.operation, "create");
        assert!(matches!(err.source, StoreError::Constraint { .. }));
    }

    #[tokio::test]
    async fn test_read_not_found_is_wrapped_with_id() {
        let mut store = MockStore::<Link>::new();
        store
            .expect_read()
            .with(eq(99999))
            .times(1)
            .returning(|_| {
                Err(StoreError::NotFound {
                    kind: RecordKind::Link,
                })
            });

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let err = service.read(99999).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.id, Some(99999));
    }

    #[tokio::test]
    async fn test_update_reads_applies_and_rereads() {
        let mut store = MockStore::<Link>::new();
        let mut seq = mockall::Sequence::new();

        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(stored_link()));
        store
            .expect_update()
            .withf(|stored, proposed| {
                stored.long_link == "https://ya.ru" && proposed.long_link == "https://mail.ru"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|stored, proposed| Ok(ChangeSet::of(stored, proposed)));
        store
            .expect_read()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(Link {
                    long_link: "https://mail.ru".to_string(),
                    ..stored_link()
                })
            });

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let updated = service
            .update(1, &patch(json!({ "long_link": "https://mail.ru" })))
            .await
            .unwrap();

        assert_eq!(updated.long_link, "https://mail.ru");
        assert_eq!(updated.click_counter, 100);
    }

    #[tokio::test]
    async fn test_update_with_bad_patch_never_writes() {
        let mut store = MockStore::<Link>::new();
        store.expect_read().times(1).returning(|_| Ok(stored_link()));
        store.expect_update().never();

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let err = service
            .update(1, &patch(json!({ "is_active": "nope" })))
            .await
            .unwrap_err();

        assert!(matches!(err.source, StoreError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn test_update_missing_record_fails_fast() {
        let mut store = MockStore::<Link>::new();
        store.expect_read().times(1).returning(|_| {
            Err(StoreError::NotFound {
                kind: RecordKind::Link,
            })
        });
        store.expect_update().never();

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let err = service
            .update(42, &patch(json!({ "is_active": false })))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.operation, "update");
    }

    #[tokio::test]
    async fn test_delete_returns_previous_record() {
        let mut store = MockStore::<Link>::new();
        store.expect_read().times(1).returning(|_| Ok(stored_link()));
        store
            .expect_delete()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let deleted = service.delete(1).await.unwrap();

        assert_eq!(deleted, stored_link());
    }

    #[tokio::test]
    async fn test_delete_row_count_mismatch() {
        let mut store = MockStore::<Link>::new();
        store.expect_read().times(1).returning(|_| Ok(stored_link()));
        store.expect_delete().times(1).returning(|_| {
            Err(StoreError::RowCountMismatch {
                kind: RecordKind::Link,
                operation: "delete",
                affected: 0,
            })
        });

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));
        let err = service.delete(1).await.unwrap_err();

        assert!(matches!(err.source, StoreError::RowCountMismatch { .. }));
    }

    #[tokio::test]
    async fn test_record_click_increments_by_one() {
        let mut store = MockStore::<Link>::new();
        store.expect_read().times(2).returning(|_| Ok(stored_link()));
        store
            .expect_update()
            .withf(|stored, proposed| {
                stored.click_counter == 100 && proposed.click_counter == 101
            })
            .times(1)
            .returning(|stored, proposed| Ok(ChangeSet::of(stored, proposed)));

        let service = LinkService::<MockStore<Link>>::new(Arc::new(store));

        assert!(service.record_click(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_swallows_failures() {
        let mut store = MockStore::<User>::new();
        store.expect_check().times(1).returning(|_| None);

        let service = UserService::<MockStore<User>>::new(Arc::new(store));

        assert!(service.check("admin", "wrong").await.is_none());
    }

    #[tokio::test]
    async fn test_create_for_link_uses_derived_token() {
        let tokens = TokenGenerator::with_default_alphabet("test-salt", 6).unwrap();
        let expected = tokens.encode(11);

        let mut store = MockStore::<ShortLink>::new();
        let token = expected.clone();
        store
            .expect_create()
            .withf(move |short| short.token == token && short.long_link_id == 11)
            .times(1)
            .returning(|_| Ok(3));

        let service = ShortLinkService::<MockStore<ShortLink>>::new(Arc::new(store));
        let short = service.create_for_link(11, &tokens).await.unwrap();

        assert_eq!(short.id, 3);
        assert_eq!(short.token, expected);
    }

    #[tokio::test]
    async fn test_find_by_token_rejects_duplicates() {
        let mut store = MockStore::<ShortLink>::new();
        store
            .expect_search()
            .withf(|column, value| column == "token" && *value == FieldValue::from("p2z68d"))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    ShortLink::new("p2z68d", 1),
                    ShortLink::new("p2z68d", 2),
                ])
            });

        let service = ShortLinkService::<MockStore<ShortLink>>::new(Arc::new(store));
        let err = service.find_by_token("p2z68d").await.unwrap_err();

        assert!(matches!(err.source, StoreError::MultipleFound { .. }));
    }

    #[tokio::test]
    async fn test_find_by_token_not_found() {
        let mut store = MockStore::<ShortLink>::new();
        store.expect_search().times(1).returning(|_, _| Ok(vec![]));

        let service = ShortLinkService::<MockStore<ShortLink>>::new(Arc::new(store));
        let err = service.find_by_token("zzzzzz").await.unwrap_err();

        assert!(err.is_not_found());
    }
}
