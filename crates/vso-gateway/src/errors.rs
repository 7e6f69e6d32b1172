use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};

/// Terminal failure classes for a report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    MissingField,
    UnknownStage,
    BackendUnavailable,
    NotImplemented,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::MissingField => "MissingField",
            Self::UnknownStage => "UnknownStage",
            Self::BackendUnavailable => "BackendUnavailable",
            Self::NotImplemented => "NotImplemented",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::MissingField | Self::UnknownStage => {
                StatusCode::BAD_REQUEST
            }
            Self::BackendUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

/// Structured error payload returned by the report endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsoApiError {
    pub kind: FailureKind,
    pub message: String,
    pub details: Option<String>,
}

impl VsoApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            FailureKind::MissingField,
            format!("Missing required field: {field}"),
        )
    }

    pub fn unknown_stage(stage: &str) -> Self {
        Self::new(FailureKind::UnknownStage, format!("Unknown Stage '{stage}'"))
    }

    pub fn backend_unavailable(details: impl Into<String>) -> Self {
        Self::new(FailureKind::BackendUnavailable, "Span query failed").with_details(details)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotImplemented, message)
    }

    pub fn to_json(&self) -> Value {
        let mut error = Map::new();
        error.insert("kind".to_string(), json!(self.kind.as_str()));
        error.insert("message".to_string(), json!(self.message));
        if let Some(details) = &self.details {
            error.insert("details".to_string(), json!(details));
        }
        json!({ "error": error })
    }
}

impl IntoResponse for VsoApiError {
    fn into_response(self) -> Response {
        (self.kind.status(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_failure_kinds_map_to_statuses() {
        assert_eq!(FailureKind::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(FailureKind::MissingField.status(), StatusCode::BAD_REQUEST);
        assert_eq!(FailureKind::UnknownStage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            FailureKind::BackendUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            FailureKind::NotImplemented.status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn unit_error_payload_includes_details_only_when_present() {
        assert_eq!(
            VsoApiError::missing_field("Stage").to_json(),
            json!({"error": {"kind": "MissingField", "message": "Missing required field: Stage"}})
        );
        assert_eq!(
            VsoApiError::backend_unavailable("timeout").to_json(),
            json!({"error": {
                "kind": "BackendUnavailable",
                "message": "Span query failed",
                "details": "timeout"
            }})
        );
    }
}
