//! User entity.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::domain::errors::DecodeError;
use crate::domain::record::{
    FieldValue, Record, RecordKind, Schema, Snapshot, patch_bool, patch_text,
};

/// A registered user.
///
/// `password` holds the plaintext only until the record is written; rows read
/// back from the database carry the bcrypt hash produced by pgcrypto. It is
/// never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub user_status: bool,
}

impl User {
    /// Creates an unsaved, active user with an empty profile.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_status: true,
            ..Self::default()
        }
    }
}

impl Record for User {
    const SCHEMA: &'static Schema = &Schema {
        kind: RecordKind::User,
        table: "users",
        id_column: "id",
        columns: &[
            "id",
            "username",
            "password",
            "first_name",
            "last_name",
            "email",
            "phone",
            "user_status",
        ],
        searchable: &["username", "email", "phone", "user_status"],
        insert: "INSERT INTO users (username, password, first_name, last_name, email, phone, user_status) \
                 VALUES ($1, crypt($2, gen_salt('bf', 8)), $3, $4, $5, $6, $7) RETURNING id",
        read: "SELECT id, username, password, first_name, last_name, email, phone, user_status \
               FROM users WHERE id = $1",
        list: "SELECT id, username, password, first_name, last_name, email, phone, user_status \
               FROM users ORDER BY id",
        delete: "DELETE FROM users WHERE id = $1",
        check: Some(
            "SELECT id, username, password, first_name, last_name, email, phone, user_status \
             FROM users WHERE username = $1 AND password = crypt($2, password)",
        ),
        write_exprs: &[("password", "crypt({}, gen_salt('bf', 8))")],
    };

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn create_values(&self) -> Vec<FieldValue> {
        vec![
            self.username.as_str().into(),
            self.password.as_str().into(),
            self.first_name.as_str().into(),
            self.last_name.as_str().into(),
            self.email.as_str().into(),
            self.phone.as_str().into(),
            self.user_status.into(),
        ]
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(vec![
            ("id", self.id.into()),
            ("username", self.username.as_str().into()),
            ("password", self.password.as_str().into()),
            ("first_name", self.first_name.as_str().into()),
            ("last_name", self.last_name.as_str().into()),
            ("email", self.email.as_str().into()),
            ("phone", self.phone.as_str().into()),
            ("user_status", self.user_status.into()),
        ])
    }

    fn apply(&mut self, patch: &Map<String, Value>) -> Result<(), DecodeError> {
        let mut next = self.clone();
        patch_text(patch, "username", &mut next.username)?;
        patch_text(patch, "password", &mut next.password)?;
        patch_text(patch, "first_name", &mut next.first_name)?;
        patch_text(patch, "last_name", &mut next.last_name)?;
        patch_text(patch, "email", &mut next.email)?;
        patch_text(patch, "phone", &mut next.phone)?;
        patch_bool(patch, "user_status", &mut next.user_status)?;
        *self = next;
        Ok(())
    }

    fn credentials(&self) -> Option<Vec<FieldValue>> {
        Some(vec![
            self.username.as_str().into(),
            self.password.as_str().into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_password_is_never_serialized() {
        let user = User::new("iivanov", "ivantest");

        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["username"], "iivanov");
        assert!(value.get("password").is_none());
    }

    #[test]
    fn test_create_values_follow_insert_order() {
        let mut user = User::new("test", "test");
        user.first_name = "Pavel".to_string();
        user.phone = "222".to_string();

        let values = user.create_values();

        assert_eq!(values.len(), 7);
        assert_eq!(values[0], FieldValue::from("test"));
        assert_eq!(values[2], FieldValue::from("Pavel"));
        assert_eq!(values[5], FieldValue::from("222"));
        assert_eq!(values[6], FieldValue::Bool(true));
    }

    #[test]
    fn test_apply_profile_patch() {
        let mut user = User::new("user", "pass");

        user.apply(&patch(json!({
            "email": "vpupkin@example.loc",
            "user_status": false,
            "nickname": "vasya"
        })))
        .unwrap();

        assert_eq!(user.email, "vpupkin@example.loc");
        assert!(!user.user_status);
        assert_eq!(user.username, "user");
    }

    #[test]
    fn test_apply_rejects_string_status() {
        let mut user = User::new("user", "pass");

        let err = user
            .apply(&patch(json!({ "user_status": "true" })))
            .unwrap_err();

        assert_eq!(err.field, "user_status");
        assert!(user.user_status);
    }

    #[test]
    fn test_credentials_are_username_and_password() {
        let user = User::new("admin", "admin");

        assert_eq!(
            user.credentials(),
            Some(vec![FieldValue::from("admin"), FieldValue::from("admin")])
        );
    }

    #[test]
    fn test_password_write_expression() {
        assert_eq!(
            User::SCHEMA.write_expr("password", "$2"),
            "crypt($2, gen_salt('bf', 8))"
        );
        assert_eq!(User::SCHEMA.write_expr("email", "$1"), "$1");
    }
}
