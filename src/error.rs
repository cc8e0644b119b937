//! Error types and the JSON error envelope

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

use crate::{
    models::ObjectId,
    validation::{self, ViolationKind},
};

const VALIDATION_FAILED: &str = "Validation failed";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Request input failed schema validation
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    /// Domain rule violation scoped to one field
    #[error("{}", .0.message)]
    BadRequest(FieldError),

    #[error("{}", .0.message)]
    NotFound(FieldError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn duplicate_isbn(isbn: &str) -> Self {
        AppError::BadRequest(FieldError::new(
            "isbn",
            "unique",
            "Book with this ISBN already exists",
            Value::String(isbn.to_string()),
        ))
    }

    /// `path` is the request field that carried the identifier.
    pub fn book_not_found(path: &str, id: &ObjectId) -> Self {
        AppError::NotFound(FieldError::new(
            path,
            "not_found",
            "Book not found",
            Value::String(id.to_string()),
        ))
    }

    pub fn insufficient_copies(available: i32, requested: i32) -> Self {
        let mut error = FieldError::new(
            "copies",
            "min",
            format!("Only {} copies available", available),
            Value::from(requested),
        );
        error.properties.min = Some(Value::from(1));
        AppError::BadRequest(error)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error envelope for this error
    pub fn to_response_body(&self) -> ErrorResponse {
        match self {
            AppError::Validation(errors) => ErrorResponse::validation(
                errors
                    .field_errors()
                    .into_iter()
                    .filter_map(|(field, errors)| {
                        errors
                            .first()
                            .map(|error| FieldError::from_violation(&field.to_string(), error))
                    })
                    .collect(),
            ),
            AppError::BadRequest(error) | AppError::NotFound(error) => {
                ErrorResponse::validation(vec![error.clone()])
            }
            AppError::Database(_) => ErrorResponse::internal("DatabaseError", self.to_string()),
            AppError::Internal(_) => ErrorResponse::internal("InternalError", self.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(validation::single(
            "body",
            validation::violation(ViolationKind::InvalidJson, rejection.body_text(), None),
        ))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(validation::single(
            "params",
            validation::violation(ViolationKind::InvalidFormat, rejection.body_text(), None),
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(validation::single(
            "query",
            validation::violation(ViolationKind::InvalidFormat, rejection.body_text(), None),
        ))
    }
}

/// Details attached to a field error
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldErrorProperties {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub max: Option<Value>,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub message: String,
    pub name: String,
    pub properties: FieldErrorProperties,
    pub kind: String,
    pub path: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

impl FieldError {
    pub fn new(path: &str, kind: &str, message: impl Into<String>, value: Value) -> Self {
        let message = message.into();
        Self {
            message: message.clone(),
            name: "ValidatorError".to_string(),
            properties: FieldErrorProperties {
                message,
                kind: kind.to_string(),
                min: None,
                max: None,
            },
            kind: kind.to_string(),
            path: path.to_string(),
            value,
        }
    }

    fn from_violation(path: &str, violation: &ValidationError) -> Self {
        let message = violation
            .message
            .as_ref()
            .map(|message| message.to_string())
            .unwrap_or_else(|| violation.code.to_string());
        let value = violation.params.get("value").cloned().unwrap_or(Value::Null);

        let mut error = Self::new(path, &violation.code, message, value);
        error.properties.min = violation.params.get("min").cloned();
        error.properties.max = violation.params.get("max").cloned();
        error
    }
}

/// Error class and per-field details
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorDetails {
    pub name: String,
    pub errors: BTreeMap<String, FieldError>,
}

/// Error response body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            message: VALIDATION_FAILED.to_string(),
            success: false,
            error: ErrorDetails {
                name: "ValidationError".to_string(),
                errors: errors
                    .into_iter()
                    .map(|error| (error.path.clone(), error))
                    .collect(),
            },
        }
    }

    fn internal(name: &str, message: String) -> Self {
        let mut general = FieldError::new("server", "internal", message, Value::Null);
        general.name = name.to_string();
        Self {
            message: "Internal server error".to_string(),
            success: false,
            error: ErrorDetails {
                name: name.to_string(),
                errors: BTreeMap::from([("general".to_string(), general)]),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!(error = ?e, "database error"),
            AppError::Internal(msg) => tracing::error!("internal error: {}", msg),
            _ => tracing::debug!(status = status.as_u16(), "request rejected: {}", self),
        }

        (status, Json(self.to_response_body())).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
