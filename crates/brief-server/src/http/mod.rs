mod routes;

pub use routes::create_router;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use brief_core::{BriefError, BriefGenerator, BriefStore, ErrorKind, HealthReporter, LlmError, Violation};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BriefStore>,
    pub generator: Arc<BriefGenerator>,
    pub health: HealthReporter,
}

impl AppState {
    pub fn new(generator: BriefGenerator) -> Self {
        let store = generator.store().clone();
        let health = HealthReporter::new(store.clone(), generator.llm_configured());
        Self {
            store,
            generator: Arc::new(generator),
            health,
        }
    }
}

/// Error body returned by every route.
#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'static str,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a [Violation]>,
}

/// Custom error type for HTTP handlers
pub struct ApiError(pub BriefError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidRequest | ErrorKind::LlmNotConfigured => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::TransportFailure
            | ErrorKind::MalformedModelOutput
            | ErrorKind::SchemaViolation
            | ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self.0.kind() {
            ErrorKind::InvalidRequest => "Invalid request",
            ErrorKind::LlmNotConfigured => "LLM not configured",
            ErrorKind::TransportFailure => "LLM API error",
            ErrorKind::RateLimited => "Rate limit exceeded",
            ErrorKind::MalformedModelOutput => "LLM returned invalid JSON",
            ErrorKind::SchemaViolation => "Brief generation failed schema validation",
            ErrorKind::NotFound => "Brief not found",
            ErrorKind::StorageFailure => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();

        // Storage detail stays in the log.
        let message = if kind == ErrorKind::StorageFailure {
            error!("Storage failure: {}", self.0);
            "storage operation failed".to_string()
        } else {
            if status.is_server_error() {
                error!("{}: {}", kind, self.0);
            } else {
                warn!("{}: {}", kind, self.0);
            }
            self.0.to_string()
        };

        let body = ErrorBody {
            error: self.title(),
            kind,
            message,
            details: self.0.violations(),
        };
        let mut response = (status, Json(body)).into_response();

        if let BriefError::Llm(LlmError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        }) = &self.0
        {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<BriefError> for ApiError {
    fn from(err: BriefError) -> Self {
        Self(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::ViolationKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BriefError::invalid_request("bad"), StatusCode::BAD_REQUEST),
            (BriefError::LlmNotConfigured("no key".into()), StatusCode::BAD_REQUEST),
            (
                BriefError::Llm(LlmError::RateLimited {
                    retry_after_secs: None,
                    message: "slow down".into(),
                }),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                BriefError::Llm(LlmError::Api {
                    status: 503,
                    message: "over capacity".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                BriefError::MalformedModelOutput("eof".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (BriefError::SchemaViolation(vec![]), StatusCode::INTERNAL_SERVER_ERROR),
            (BriefError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                BriefError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = ApiError(BriefError::Llm(LlmError::RateLimited {
            retry_after_secs: Some(12),
            message: "slow down".into(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }

    #[test]
    fn test_error_body_shape() {
        let err = BriefError::SchemaViolation(vec![Violation::new(
            "key_points",
            ViolationKind::Missing,
            "required field is missing",
        )]);
        let body = ErrorBody {
            error: "Brief generation failed schema validation",
            kind: err.kind(),
            message: err.to_string(),
            details: err.violations(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["kind"], "schema_violation");
        assert_eq!(value["details"][0]["path"], "key_points");
        assert_eq!(value["details"][0]["kind"], "missing");

        let plain = ErrorBody {
            error: "Brief not found",
            kind: ErrorKind::NotFound,
            message: "Brief not found: x".into(),
            details: None,
        };
        assert!(serde_json::to_value(&plain).unwrap().get("details").is_none());
    }
}
