//! In-memory backend adapter with deferred responses.

use crate::backend::{Backend, BodyMatcher, Handler, UrlPattern};
use crate::error::FacadeError;
use crate::types::{HttpMethod, Request, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Definition {
    method: HttpMethod,
    url: UrlPattern,
    handler: Handler,
}

struct Expectation {
    method: HttpMethod,
    url: UrlPattern,
    body: BodyMatcher,
    handler: Handler,
}

impl Expectation {
    fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

#[derive(Default)]
struct MockState {
    definitions: Vec<Definition>,
    expectations: VecDeque<Expectation>,
    pending: VecDeque<Request>,
}

/// Backend that queues requests until [`MockBackend::flush`] is called.
///
/// Expectations are checked before definitions; each expectation answers one
/// request. Definitions are matched in registration order and never consumed.
/// Handlers run without the backend lock held, so they may register new
/// definitions.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a request; it is answered on the next [`flush`](Self::flush).
    pub fn request(&self, request: Request) {
        self.lock().pending.push_back(request);
    }

    pub fn pending_requests(&self) -> usize {
        self.lock().pending.len()
    }

    /// Answer every queued request in order.
    ///
    /// Stops at the first failing request and returns its error; requests
    /// queued after it stay pending.
    pub fn flush(&self) -> Result<Vec<Response>, FacadeError> {
        if self.lock().pending.is_empty() {
            return Err(FacadeError::NoPendingRequest);
        }

        let mut responses = Vec::new();
        loop {
            let next = self.lock().pending.pop_front();
            let Some(request) = next else {
                break;
            };
            responses.push(self.handle(&request)?);
        }
        debug!(count = responses.len(), "flushed requests");
        Ok(responses)
    }

    /// Answer a single request immediately.
    pub fn handle(&self, request: &Request) -> Result<Response, FacadeError> {
        let handler = self.take_handler(request)?;
        debug!(method = %request.method, url = %request.url, "dispatching request");
        handler(request)
    }

    fn take_handler(&self, request: &Request) -> Result<Handler, FacadeError> {
        let mut state = self.lock();

        let expected = state
            .expectations
            .iter()
            .position(|e| e.method == request.method && e.url.matches(&request.url));
        if let Some(index) = expected {
            if !(state.expectations[index].body)(request.body.as_deref()) {
                return Err(FacadeError::ExpectationFailed {
                    method: request.method.to_string(),
                    url: request.url.clone(),
                    body: request.body.clone().unwrap_or_default(),
                });
            }
            if let Some(expectation) = state.expectations.remove(index) {
                return Ok(expectation.handler);
            }
        }

        state
            .definitions
            .iter()
            .find(|d| d.method == request.method && d.url.matches(&request.url))
            .map(|d| Arc::clone(&d.handler))
            .ok_or_else(|| FacadeError::UnexpectedRequest {
                method: request.method.to_string(),
                url: request.url.clone(),
            })
    }

    /// Fail if any registered expectation has not been exercised.
    pub fn verify_no_outstanding_expectation(&self) -> Result<(), FacadeError> {
        let state = self.lock();
        if state.expectations.is_empty() {
            Ok(())
        } else {
            Err(FacadeError::UnsatisfiedExpectations(
                state.expectations.iter().map(Expectation::describe).collect(),
            ))
        }
    }

    /// Drop all expectations, keeping definitions.
    pub fn reset_expectations(&self) {
        self.lock().expectations.clear();
    }

    pub fn definition_count(&self) -> usize {
        self.lock().definitions.len()
    }
}

impl Backend for MockBackend {
    fn when(&self, method: HttpMethod, url: UrlPattern, handler: Handler) {
        debug!(%method, %url, "registering definition");
        self.lock().definitions.push(Definition {
            method,
            url,
            handler,
        });
    }

    fn expect(&self, method: HttpMethod, url: UrlPattern, body: BodyMatcher, handler: Handler) {
        debug!(%method, %url, "registering expectation");
        self.lock().expectations.push_back(Expectation {
            method,
            url,
            body,
            handler,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use serde_json::json;

    fn respond_with(status: u16) -> Handler {
        Arc::new(move |request: &Request| {
            Ok(Response::json(status, &json!({ "url": request.url })))
        })
    }

    #[rstest]
    fn test_flush_answers_in_order() {
        let backend = MockBackend::new();
        backend.when_get("/a", respond_with(200));
        backend.when_post("/b", respond_with(201));

        backend.request(Request::get("/a"));
        backend.request(Request::post("/b"));
        assert_eq!(backend.pending_requests(), 2);

        let responses = backend.flush().unwrap();
        let statuses: Vec<u16> = responses.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![200, 201]);
        assert_eq!(backend.pending_requests(), 0);
    }

    #[rstest]
    fn test_flush_without_requests() {
        let err = MockBackend::new().flush().unwrap_err();
        assert!(matches!(err, FacadeError::NoPendingRequest));
    }

    #[rstest]
    fn test_unexpected_request() {
        let backend = MockBackend::new();
        backend.when_get("/a", respond_with(200));
        backend.request(Request::get("/nope"));
        backend.request(Request::get("/a"));

        let err = backend.flush().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("Unexpected request: GET /nope"));
        assert_eq!(backend.pending_requests(), 1);
    }

    #[rstest]
    fn test_first_definition_wins() {
        let backend = MockBackend::new();
        backend.when_put("/a", respond_with(200));
        backend.when_put("/a", respond_with(500));
        assert_eq!(backend.handle(&Request::put("/a")).unwrap().status, 200);
        assert_eq!(backend.definition_count(), 2);
    }

    #[rstest]
    fn test_regex_definition() {
        let backend = MockBackend::new();
        backend.when(
            HttpMethod::Delete,
            UrlPattern::Regex(regex::Regex::new(r"^/items/\d+$").unwrap()),
            respond_with(204),
        );
        assert_eq!(backend.handle(&Request::delete("/items/3")).unwrap().status, 204);
        assert!(backend.handle(&Request::delete("/items/x")).is_err());
    }

    #[rstest]
    fn test_expectation_checks_body_and_is_consumed() {
        let backend = MockBackend::new();
        backend.when_post("/a", respond_with(200));
        let matcher: BodyMatcher = Arc::new(|body: Option<&str>| body.is_some_and(|b| b.contains("yes")));
        backend.expect(HttpMethod::Post, UrlPattern::exact("/a"), matcher, respond_with(202));

        let err = backend
            .handle(&Request::post("/a").with_body(r#"{"answer":"no"}"#))
            .unwrap_err();
        assert!(matches!(err, FacadeError::ExpectationFailed { .. }));
        assert!(backend.verify_no_outstanding_expectation().is_err());

        let ok = backend
            .handle(&Request::post("/a").with_body(r#"{"answer":"yes"}"#))
            .unwrap();
        assert_eq!(ok.status, 202);
        backend.verify_no_outstanding_expectation().unwrap();

        // later requests fall through to the definition
        assert_eq!(backend.handle(&Request::post("/a")).unwrap().status, 200);
    }

    #[rstest]
    fn test_reset_expectations() {
        let backend = MockBackend::new();
        backend.expect(
            HttpMethod::Put,
            UrlPattern::exact("/a"),
            Arc::new(|_: Option<&str>| true),
            respond_with(200),
        );
        let err = backend.verify_no_outstanding_expectation().unwrap_err();
        assert!(err.to_string().contains("PUT /a"));
        backend.reset_expectations();
        backend.verify_no_outstanding_expectation().unwrap();
    }

    #[rstest]
    fn test_handler_may_register_definitions() {
        let backend = MockBackend::new();
        let inner = backend.clone();
        backend.when_post(
            "/register",
            Arc::new(move |_: &Request| {
                inner.when_get("/registered", respond_with(200));
                Ok(Response::ok(&json!(null)))
            }),
        );
        backend.handle(&Request::post("/register")).unwrap();
        assert_eq!(backend.handle(&Request::get("/registered")).unwrap().status, 200);
    }
}
