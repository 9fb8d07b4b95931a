//! DTOs for user endpoints.

use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::domain::entities::User;

/// Usernames are ASCII letters, digits, `_`, `-` and `.`.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

/// Request body for `POST /api/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(min = 4, max = 72))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub last_name: String,

    #[validate(email)]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: String,
}

impl From<CreateUserRequest> for User {
    fn from(request: CreateUserRequest) -> Self {
        User {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email.unwrap_or_default(),
            phone: request.phone,
            ..User::new(request.username, request.password)
        }
    }
}

/// Request body for `PATCH /api/users/{id}`. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_username"))]
    pub username: Option<String>,

    #[validate(length(min = 4, max = 72))]
    pub password: Option<String>,

    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    pub user_status: Option<bool>,
}

impl UpdateUserRequest {
    /// The sparse patch holding only the fields present in the request.
    pub fn into_patch(self) -> Map<String, Value> {
        let mut patch = Map::new();
        let texts = [
            ("username", self.username),
            ("password", self.password),
            ("first_name", self.first_name),
            ("last_name", self.last_name),
            ("email", self.email),
            ("phone", self.phone),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                patch.insert(key.to_string(), Value::String(value));
            }
        }
        if let Some(status) = self.user_status {
            patch.insert("user_status".to_string(), Value::Bool(status));
        }
        patch
    }
}
