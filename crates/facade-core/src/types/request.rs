//! Incoming request as seen by a route handler.

use crate::error::FacadeError;
use crate::types::method::HttpMethod;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Request or response headers
pub type Headers = HashMap<String, String>;

/// HTTP request handed to a route handler by the backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: HttpMethod,
    /// Full request URL, compared verbatim against route keys
    pub url: String,
    /// Raw body as sent by the client (JSON text)
    pub body: Option<String>,
    pub headers: Headers,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Headers::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// `METHOD URL`, the exact-match key used by the route registry
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Parse the body as JSON. A missing or blank body reads as `{}`.
    pub fn json_body(&self) -> Result<Value, FacadeError> {
        match self.body.as_deref().map(str::trim) {
            None | Some("") => Ok(Value::Object(Map::new())),
            Some(raw) => Ok(serde_json::from_str(raw)?),
        }
    }
}
