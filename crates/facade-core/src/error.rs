//! Error types for registry, resource and dispatch operations.

use thiserror::Error;

/// Broad category of a [`FacadeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Configuration,
    InvalidResponse,
    Backend,
    Serialization,
}

/// Errors raised by the fixture backend.
///
/// Every failure surfaces to the caller immediately; nothing is retried.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// Malformed input: missing name/url/id, bad method, bad route spec
    #[error("{0}")]
    Validation(String),
    /// Duplicate resource name or url
    #[error("{0}")]
    Conflict(String),
    /// Unknown record id or resource name
    #[error("{0}")]
    NotFound(String),
    /// No route is registered for the given `METHOD URL`
    #[error("The route {0} does not exist")]
    RouteNotFound(String),
    /// `initialize` called without a backend adapter
    #[error(
        "backend adapter not detected. Either pass one when initializing, or set it \
         on the registry before calling initialize"
    )]
    BackendNotDetected,
    /// A custom route callback returned something other than a response tuple
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The mock backend received a request nothing was registered for
    #[error("Unexpected request: {method} {url}")]
    UnexpectedRequest { method: String, url: String },
    /// The mock backend matched an expectation but the body did not satisfy it
    #[error("Expected {method} {url} with a different body, got: {body}")]
    ExpectationFailed {
        method: String,
        url: String,
        body: String,
    },
    /// Expectations registered on the mock backend were never exercised
    #[error("Unsatisfied requests: {}", .0.join(", "))]
    UnsatisfiedExpectations(Vec<String>),
    /// `flush` called on the mock backend with an empty queue
    #[error("No pending request to flush")]
    NoPendingRequest,
    /// Request or response body is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A backend handler was invoked after its registry was dropped
    #[error("the registry owning this route has been dropped")]
    RegistryDropped,
}

impl FacadeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacadeError::Validation(_) => ErrorKind::Validation,
            FacadeError::Conflict(_) => ErrorKind::Conflict,
            FacadeError::NotFound(_) | FacadeError::RouteNotFound(_) => ErrorKind::NotFound,
            FacadeError::BackendNotDetected | FacadeError::RegistryDropped => {
                ErrorKind::Configuration
            }
            FacadeError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            FacadeError::UnexpectedRequest { .. }
            | FacadeError::ExpectationFailed { .. }
            | FacadeError::UnsatisfiedExpectations(_)
            | FacadeError::NoPendingRequest => ErrorKind::Backend,
            FacadeError::Json(_) => ErrorKind::Serialization,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        FacadeError::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        FacadeError::NotFound(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FacadeError::validation("no id"), ErrorKind::Validation)]
    #[case(FacadeError::Conflict("taken".into()), ErrorKind::Conflict)]
    #[case(FacadeError::not_found("missing"), ErrorKind::NotFound)]
    #[case(FacadeError::RouteNotFound("GET /x".into()), ErrorKind::NotFound)]
    #[case(FacadeError::BackendNotDetected, ErrorKind::Configuration)]
    #[case(FacadeError::InvalidResponse("[]".into()), ErrorKind::InvalidResponse)]
    #[case(FacadeError::NoPendingRequest, ErrorKind::Backend)]
    fn test_error_kind(#[case] error: FacadeError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    fn test_route_not_found_display() {
        let error = FacadeError::RouteNotFound("GET /api/provider/NOTREAL".into());
        assert_eq!(
            error.to_string(),
            "The route GET /api/provider/NOTREAL does not exist"
        );
    }

    #[rstest]
    fn test_backend_not_detected_mentions_backend() {
        assert!(FacadeError::BackendNotDetected
            .to_string()
            .contains("backend adapter not detected"));
    }

    #[rstest]
    fn test_json_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let error: FacadeError = json_err.into();
        assert_eq!(error.kind(), ErrorKind::Serialization);
        assert!(error.to_string().contains("JSON error"));
    }

    #[rstest]
    fn test_unsatisfied_expectations_lists_routes() {
        let error = FacadeError::UnsatisfiedExpectations(vec![
            "POST /a".to_string(),
            "PUT /b".to_string(),
        ]);
        assert_eq!(error.to_string(), "Unsatisfied requests: POST /a, PUT /b");
    }
}
