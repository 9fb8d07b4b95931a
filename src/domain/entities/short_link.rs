//! ShortLink entity: the token under which a link is reachable.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::domain::errors::DecodeError;
use crate::domain::record::{FieldValue, Record, RecordKind, Schema, Snapshot, patch_int, patch_text};

/// Maps a unique token to exactly one [`crate::domain::entities::Link`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub token: String,
    pub long_link_id: i64,
}

impl ShortLink {
    pub fn new(token: impl Into<String>, long_link_id: i64) -> Self {
        Self {
            id: 0,
            token: token.into(),
            long_link_id,
        }
    }
}

impl Record for ShortLink {
    const SCHEMA: &'static Schema = &Schema {
        kind: RecordKind::ShortLink,
        table: "shortlinks",
        id_column: "id",
        columns: &["id", "token", "long_link_id"],
        searchable: &["token", "long_link_id"],
        insert: "INSERT INTO shortlinks (token, long_link_id) VALUES ($1, $2) RETURNING id",
        read: "SELECT id, token, long_link_id FROM shortlinks WHERE id = $1",
        list: "SELECT id, token, long_link_id FROM shortlinks ORDER BY id",
        delete: "DELETE FROM shortlinks WHERE id = $1",
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
        vec![self.token.as_str().into(), self.long_link_id.into()]
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(vec![
            ("id", self.id.into()),
            ("token", self.token.as_str().into()),
            ("long_link_id", self.long_link_id.into()),
        ])
    }

    fn apply(&mut self, patch: &Map<String, Value>) -> Result<(), DecodeError> {
        let mut next = self.clone();
        patch_text(patch, "token", &mut next.token)?;
        patch_int(patch, "long_link_id", &mut next.long_link_id)?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_and_values() {
        let short = ShortLink::new("p2z68d", 1);

        assert_eq!(short.kind(), RecordKind::ShortLink);
        assert_eq!(
            short.create_values(),
            vec![FieldValue::from("p2z68d"), FieldValue::Int(1)]
        );
    }

    #[test]
    fn test_apply_rejects_non_integer_link_id() {
        let mut short = ShortLink::new("p2z68d", 1);
        let patch = json!({ "token": "08ky2q", "long_link_id": "two" });

        let err = short.apply(patch.as_object().unwrap()).unwrap_err();

        assert_eq!(err.field, "long_link_id");
        assert_eq!(short.token, "p2z68d");
    }
}
