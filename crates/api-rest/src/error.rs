//! RPC error envelope.
//!
//! Every failure leaves the API as
//!
//! ```json
//! {"error": {"code": "CONFLICT", "message": "...", "issues": []}}
//! ```
//!
//! with an HTTP status derived from `code`.

use api_shared::{FieldIssue, ValidationErrors};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use midwifery_core::{ClinicError, ErrorCategory};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    ParseError,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    MethodNotSupported,
    InternalServerError,
}

impl RpcErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            RpcErrorCode::BadRequest | RpcErrorCode::ParseError => StatusCode::BAD_REQUEST,
            RpcErrorCode::NotFound => StatusCode::NOT_FOUND,
            RpcErrorCode::Conflict => StatusCode::CONFLICT,
            RpcErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcErrorCode::Forbidden => StatusCode::FORBIDDEN,
            RpcErrorCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            RpcErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
    /// Field-level validation issues; empty for every other code.
    pub issues: Vec<FieldIssue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct RpcErrorEnvelope {
    pub error: RpcError,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    pub fn unknown_procedure(name: &str) -> Self {
        Self::new(RpcErrorCode::NotFound, format!("no procedure named {name:?}"))
    }

    pub fn parse(err: serde_json::Error) -> Self {
        Self::new(RpcErrorCode::ParseError, format!("body is not valid JSON: {err}"))
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl From<ValidationErrors> for RpcError {
    fn from(err: ValidationErrors) -> Self {
        Self {
            code: RpcErrorCode::BadRequest,
            message: err.to_string(),
            issues: err.issues,
        }
    }
}

impl From<ClinicError> for RpcError {
    fn from(err: ClinicError) -> Self {
        let code = match err.category() {
            ErrorCategory::NotFound => RpcErrorCode::NotFound,
            ErrorCategory::Conflict => RpcErrorCode::Conflict,
            ErrorCategory::Auth => RpcErrorCode::Unauthorized,
            ErrorCategory::Forbidden => RpcErrorCode::Forbidden,
            ErrorCategory::Internal => RpcErrorCode::InternalServerError,
        };

        match code {
            RpcErrorCode::InternalServerError => {
                tracing::error!("Clinic error: {:?}", err);
                Self::new(code, "Internal error")
            }
            RpcErrorCode::NotFound => {
                tracing::debug!("Clinic error: {}", err);
                Self::new(code, err.to_string())
            }
            _ => {
                tracing::warn!("Clinic error: {}", err);
                Self::new(code, err.to_string())
            }
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.status(), Json(RpcErrorEnvelope { error: self })).into_response()
    }
}
