//! Error types of the persistence core.

use crate::domain::record::RecordKind;

/// A value could not populate a record field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot decode field `{field}`: {reason}")]
pub struct DecodeError {
    pub field: String,
    pub reason: String,
}

impl DecodeError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures raised by a [`crate::domain::repositories::Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A single-row lookup matched nothing.
    #[error("{kind} not found")]
    NotFound { kind: RecordKind },

    /// A primary-key lookup matched several rows. The schema is broken.
    #[error("multiple {kind} rows matched a single-row lookup")]
    MultipleFound { kind: RecordKind },

    /// The database rejected a write because of a uniqueness or foreign-key rule.
    #[error("constraint violation: {}", .constraint.as_deref().unwrap_or("unknown"))]
    Constraint {
        constraint: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} on {kind} affected {affected} rows, expected exactly 1")]
    RowCountMismatch {
        kind: RecordKind,
        operation: &'static str,
        affected: u64,
    },

    /// A row could not be decoded into the record type.
    #[error(transparent)]
    Decode(DecodeError),

    /// A caller-supplied patch did not fit the record type.
    #[error("invalid patch: {0}")]
    InvalidPatch(DecodeError),

    #[error("{kind} cannot be searched by `{column}`")]
    UnknownColumn { kind: RecordKind, column: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let violation = e
            .as_database_error()
            .filter(|db| db.is_unique_violation() || db.is_foreign_key_violation())
            .map(|db| db.constraint().map(str::to_owned));

        if let Some(constraint) = violation {
            return StoreError::Constraint {
                constraint,
                source: e,
            };
        }

        match e {
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::Decode(DecodeError::new(index, source.to_string()))
            }
            sqlx::Error::ColumnNotFound(column) => {
                StoreError::Decode(DecodeError::new(column, "column missing from row"))
            }
            other => StoreError::Database(other),
        }
    }
}

/// A store failure annotated with the repository operation that hit it.
#[derive(Debug, thiserror::Error)]
#[error("cannot {operation} {entity}{}: {source}", id_suffix(.id))]
pub struct RepositoryError {
    pub entity: RecordKind,
    pub operation: &'static str,
    pub id: Option<i64>,
    #[source]
    pub source: StoreError,
}

impl RepositoryError {
    pub fn new(
        entity: RecordKind,
        operation: &'static str,
        id: Option<i64>,
        source: StoreError,
    ) -> Self {
        Self {
            entity,
            operation,
            id,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.source, StoreError::NotFound { .. })
    }
}

fn id_suffix(id: &Option<i64>) -> String {
    id.map(|id| format!(" {id}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_message_includes_context() {
        let err = RepositoryError::new(
            RecordKind::Link,
            "read",
            Some(99999),
            StoreError::NotFound {
                kind: RecordKind::Link,
            },
        );

        assert_eq!(err.to_string(), "cannot read link 99999: link not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_repository_error_without_id() {
        let err = RepositoryError::new(
            RecordKind::User,
            "search",
            None,
            StoreError::UnknownColumn {
                kind: RecordKind::User,
                column: "password".to_string(),
            },
        );

        assert_eq!(
            err.to_string(),
            "cannot search user: user cannot be searched by `password`"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_row_count_mismatch_message() {
        let err = StoreError::RowCountMismatch {
            kind: RecordKind::ShortLink,
            operation: "delete",
            affected: 0,
        };

        assert_eq!(
            err.to_string(),
            "delete on shortlink affected 0 rows, expected exactly 1"
        );
    }

    #[test]
    fn test_column_decode_maps_to_decode_error() {
        let err: StoreError = sqlx::Error::ColumnNotFound("token".to_string()).into();

        assert!(matches!(err, StoreError::Decode(ref d) if d.field == "token"));
    }

    #[test]
    fn test_other_sqlx_errors_map_to_database() {
        let err: StoreError = sqlx::Error::RowNotFound.into();

        assert!(matches!(err, StoreError::Database(_)));
    }
}
