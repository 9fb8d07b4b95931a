//! Success envelope shared by all JSON endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Wraps a payload under a key naming what happened to it.
///
/// Serializes as `{"created": ...}`, `{"read": ...}` and so on.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply<T> {
    Created(T),
    Read(T),
    Updated(T),
    Deleted(T),
    Found(T),
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let status = match self {
            Reply::Created(_) => StatusCode::CREATED,
            _ => StatusCode::OK,
        };
        (status, Json(self)).into_response()
    }
}
