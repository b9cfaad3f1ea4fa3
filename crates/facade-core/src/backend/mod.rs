//! Backend adapter contract.
//!
//! The registry never performs I/O itself. It registers handlers against a
//! [`Backend`], which intercepts requests made by the code under test and
//! invokes the matching handler. [`MockBackend`] is an in-memory adapter with
//! `when`/`expect`/`flush` semantics for driving tests.

mod mock;

pub use mock::MockBackend;

use crate::error::FacadeError;
use crate::types::{HttpMethod, Request, Response};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Handler invoked by a backend for a matched request.
pub type Handler = Arc<dyn Fn(&Request) -> Result<Response, FacadeError> + Send + Sync>;

/// Predicate over the raw request body, used by expectations.
pub type BodyMatcher = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// URL a backend definition responds to.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Exact(String),
    Regex(Regex),
}

impl UrlPattern {
    pub fn exact(url: impl Into<String>) -> Self {
        UrlPattern::Exact(url.into())
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Exact(expected) => expected == url,
            UrlPattern::Regex(pattern) => pattern.is_match(url),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Exact(url) => f.write_str(url),
            UrlPattern::Regex(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

/// HTTP interception mechanism the registry registers its routes against.
pub trait Backend: Send + Sync {
    /// Respond to every request matching `method` and `url` with `handler`.
    fn when(&self, method: HttpMethod, url: UrlPattern, handler: Handler);

    /// Require one request matching `method` and `url` whose raw body
    /// satisfies `body`, answered by `handler`.
    fn expect(&self, method: HttpMethod, url: UrlPattern, body: BodyMatcher, handler: Handler);

    fn when_get(&self, url: &str, handler: Handler) {
        self.when(HttpMethod::Get, UrlPattern::exact(url), handler);
    }

    fn when_post(&self, url: &str, handler: Handler) {
        self.when(HttpMethod::Post, UrlPattern::exact(url), handler);
    }

    fn when_put(&self, url: &str, handler: Handler) {
        self.when(HttpMethod::Put, UrlPattern::exact(url), handler);
    }

    fn when_delete(&self, url: &str, handler: Handler) {
        self.when(HttpMethod::Delete, UrlPattern::exact(url), handler);
    }
}
