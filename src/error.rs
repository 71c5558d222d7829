// src/error.rs

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400: malformed input or a violated business rule.
    #[error("{message}")]
    Validation {
        message: String,
        data: Option<Value>,
    },

    /// 401: missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// 403: the entity exists but the acting user may not touch it.
    #[error("{0}")]
    Permission(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    /// 400: duplicate like or any other unique-constraint hit.
    #[error("{0}")]
    Conflict(String),

    // 500 Internal Server Error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            data: None,
        }
    }

    /// Validation error pinned to a single request field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AppError::Validation {
            data: Some(json!({ field: [message.clone()] })),
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts the error into the `{code, message, data}` envelope.
/// Internal details are logged, never returned.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, data) = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                ("Internal Server Error".to_string(), Value::Null)
            }
            AppError::Validation { message, data } => (message, data.unwrap_or(Value::Null)),
            AppError::Unauthorized(msg)
            | AppError::Permission(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => (msg, Value::Null),
        };

        let body = Json(json!({
            "code": status.as_u16(),
            "message": message,
            "data": data,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` on database queries.
/// Unique violations surface as conflicts so racing duplicate inserts get a 400.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = serde_json::Map::new();
        let mut first = None;

        for (field, errs) in errors.field_errors() {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            if first.is_none() {
                first = messages.first().cloned();
            }
            fields.insert(field.to_string(), json!(messages));
        }

        AppError::Validation {
            message: first.unwrap_or_else(|| "Invalid request".to_string()),
            data: Some(Value::Object(fields)),
        }
    }
}

/// Bodies that fail to parse. A missing required field is reported against
/// that field, anything else (bad syntax, wrong types, content type) as a
/// message-only validation error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        match missing_field(&detail) {
            Some(field) => AppError::field(field, format!("{field} is required")),
            None => AppError::validation(detail),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

/// Pulls the field name out of serde's "missing field `name`" message.
fn missing_field(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once("missing field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Permission("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal("db down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn field_errors_carry_field_detail() {
        match AppError::field("parent", "cannot reply to a reply") {
            AppError::Validation { message, data } => {
                assert_eq!(message, "cannot reply to a reply");
                assert_eq!(data, Some(json!({"parent": ["cannot reply to a reply"]})));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_read_from_serde_message() {
        assert_eq!(
            missing_field(
                "Failed to deserialize the JSON body into the target type: missing field `content` at line 1 column 2"
            ),
            Some("content")
        );
        assert_eq!(missing_field("expected value at line 1 column 1"), None);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
