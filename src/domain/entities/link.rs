//! Link entity: a long URL owned by a user and counted on every redirect.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::domain::errors::DecodeError;
use crate::domain::record::{
    FieldValue, Record, RecordKind, Schema, Snapshot, patch_bool, patch_opt_int, patch_text,
};

/// A target URL.
///
/// `click_counter` only grows, and only through
/// [`crate::application::services::LinkService::record_click`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Link {
    pub id: i64,
    pub long_link: String,
    pub click_counter: i64,
    pub owner_id: Option<i64>,
    pub is_active: bool,
}

impl Link {
    /// Creates an unsaved link with a zero click counter.
    pub fn new(long_link: impl Into<String>, owner_id: Option<i64>, is_active: bool) -> Self {
        Self {
            id: 0,
            long_link: long_link.into(),
            click_counter: 0,
            owner_id,
            is_active,
        }
    }
}

impl Record for Link {
    const SCHEMA: &'static Schema = &Schema {
        kind: RecordKind::Link,
        table: "links",
        id_column: "id",
        columns: &["id", "long_link", "click_counter", "owner_id", "is_active"],
        searchable: &["long_link", "owner_id", "is_active"],
        insert: "INSERT INTO links (long_link, click_counter, owner_id, is_active) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
        read: "SELECT id, long_link, click_counter, owner_id, is_active FROM links WHERE id = $1",
        list: "SELECT id, long_link, click_counter, owner_id, is_active FROM links ORDER BY id",
        delete: "DELETE FROM links WHERE id = $1",
        check: None,
        write_exprs: &[],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn create_values(&self) -> Vec<FieldValue> {
        vec![
            self.long_link.as_str().into(),
            self.click_counter.into(),
            self.owner_id.into(),
            self.is_active.into(),
        ]
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(vec![
            ("id", self.id.into()),
            ("long_link", self.long_link.as_str().into()),
            ("click_counter", self.click_counter.into()),
            ("owner_id", self.owner_id.into()),
            ("is_active", self.is_active.into()),
        ])
    }

    /// `id` and `click_counter` are not patchable.
    fn apply(&mut self, patch: &Map<String, Value>) -> Result<(), DecodeError> {
        let mut next = self.clone();
        patch_text(patch, "long_link", &mut next.long_link)?;
        patch_opt_int(patch, "owner_id", &mut next.owner_id)?;
        patch_bool(patch, "is_active", &mut next.is_active)?;
        *self = next;
        Ok(())
    }
}
