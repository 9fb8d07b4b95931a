//! Generic storage contract over every [`Record`] variant.

use async_trait::async_trait;

use crate::domain::diff::ChangeSet;
use crate::domain::errors::StoreError;
use crate::domain::record::{FieldValue, Record};

/// Create, read, search, update, delete and credential check for one record
/// variant.
///
/// Every call is a single statement. Nothing here opens a transaction, so a
/// read followed by an update can interleave with other writers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgStore`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/store_pg.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    /// Inserts the record and returns the id assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] on a uniqueness or foreign-key violation.
    async fn create(&self, record: &R) -> Result<i64, StoreError>;

    /// Reads the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches and
    /// [`StoreError::MultipleFound`] when more than one does.
    async fn read(&self, id: i64) -> Result<R, StoreError>;

    /// Returns every record whose `column` equals `value`, ordered by id.
    ///
    /// The result is not paginated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownColumn`] if `column` is not searchable.
    async fn search(&self, column: &str, value: FieldValue) -> Result<Vec<R>, StoreError>;

    /// Returns every record, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    async fn list(&self) -> Result<Vec<R>, StoreError>;

    /// Writes the columns of `proposed` that differ from `stored`.
    ///
    /// An empty change set executes nothing and succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowCountMismatch`] unless exactly one row was updated.
    async fn update(&self, stored: &R, proposed: &R) -> Result<ChangeSet, StoreError>;

    /// Deletes the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowCountMismatch`] unless exactly one row was deleted.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Looks up the stored record matching the credentials carried by `record`.
    ///
    /// Never fails: any lookup or decode problem yields `None`.
    async fn check(&self, record: &R) -> Option<R>;
}
