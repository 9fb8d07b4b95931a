//! PostgreSQL implementation of the generic store.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};

use crate::domain::diff::ChangeSet;
use crate::domain::errors::StoreError;
use crate::domain::record::{FieldValue, Record, RecordKind};
use crate::domain::repositories::Store;
use crate::infrastructure::persistence::update_compiler::compile_update;

/// Store for one record variant backed by a shared connection pool.
///
/// All SQL comes from the variant's static schema; values are always bound
/// as parameters.
pub struct PgStore<R> {
    pool: Arc<PgPool>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> PgStore<R> {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

/// Packs field values into positional PostgreSQL arguments.
fn arguments(values: Vec<FieldValue>) -> Result<PgArguments, StoreError> {
    let mut args = PgArguments::default();
    for value in values {
        let added = match value {
            FieldValue::Int(v) => args.add(v),
            FieldValue::Text(v) => args.add(v),
            FieldValue::Bool(v) => args.add(v),
            FieldValue::Null => args.add(None::<i64>),
        };
        added.map_err(|e| StoreError::Database(sqlx::Error::Encode(e)))?;
    }
    Ok(args)
}

fn expect_single_row(
    kind: RecordKind,
    operation: &'static str,
    affected: u64,
) -> Result<(), StoreError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(StoreError::RowCountMismatch {
            kind,
            operation,
            affected,
        })
    }
}

#[async_trait]
impl<R: Record> Store<R> for PgStore<R> {
    async fn create(&self, record: &R) -> Result<i64, StoreError> {
        let args = arguments(record.create_values())?;

        let id: i64 = sqlx::query_scalar_with(R::SCHEMA.insert, args)
            .fetch_one(self.pool.as_ref())
            .await?;

        tracing::debug!(kind = %R::SCHEMA.kind, id, "record created");
        Ok(id)
    }

    async fn read(&self, id: i64) -> Result<R, StoreError> {
        let args = arguments(vec![FieldValue::Int(id)])?;

        let mut rows: Vec<R> = sqlx::query_as_with(R::SCHEMA.read, args)
            .fetch_all(self.pool.as_ref())
            .await?;

        match rows.len() {
            0 => Err(StoreError::NotFound {
                kind: R::SCHEMA.kind,
            }),
            1 => rows.pop().ok_or(StoreError::NotFound {
                kind: R::SCHEMA.kind,
            }),
            _ => Err(StoreError::MultipleFound {
                kind: R::SCHEMA.kind,
            }),
        }
    }

    async fn search(&self, column: &str, value: FieldValue) -> Result<Vec<R>, StoreError> {
        let schema = R::SCHEMA;
        let column = schema
            .searchable_column(column)
            .ok_or_else(|| StoreError::UnknownColumn {
                kind: schema.kind,
                column: column.to_string(),
            })?;

        let sql = schema.search_sql(column, &value);
        let params = match value {
            FieldValue::Null => Vec::new(),
            value => vec![value],
        };
        let args = arguments(params)?;

        let rows = sqlx::query_as_with(&sql, args)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        let rows = sqlx::query_as(R::SCHEMA.list)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    async fn update(&self, stored: &R, proposed: &R) -> Result<ChangeSet, StoreError> {
        let changes = ChangeSet::of(stored, proposed);

        let Some(compiled) = compile_update(R::SCHEMA, stored.id(), &changes) else {
            tracing::debug!(kind = %R::SCHEMA.kind, id = stored.id(), "nothing to update");
            return Ok(changes);
        };

        let args = arguments(compiled.params)?;
        let result = sqlx::query_with(&compiled.sql, args)
            .execute(self.pool.as_ref())
            .await?;

        expect_single_row(R::SCHEMA.kind, "update", result.rows_affected())?;

        tracing::debug!(kind = %R::SCHEMA.kind, id = stored.id(), %changes, "record updated");
        Ok(changes)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let args = arguments(vec![FieldValue::Int(id)])?;

        let result = sqlx::query_with(R::SCHEMA.delete, args)
            .execute(self.pool.as_ref())
            .await?;

        expect_single_row(R::SCHEMA.kind, "delete", result.rows_affected())
    }

    async fn check(&self, record: &R) -> Option<R> {
        let sql = R::SCHEMA.check?;
        let args = match arguments(record.credentials()?) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!(kind = %R::SCHEMA.kind, error = %e, "credential check failed");
                return None;
            }
        };

        match sqlx::query_as_with(sql, args)
            .fetch_optional(self.pool.as_ref())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(kind = %R::SCHEMA.kind, error = %e, "credential check failed");
                None
            }
        }
    }
}
