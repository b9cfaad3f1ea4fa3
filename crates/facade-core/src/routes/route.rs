//! A single registered route and its one-shot override queue.

use crate::routes::spec::{CollectionCallback, ItemCallback};
use crate::types::{HttpMethod, Response};
use regex::Regex;
use serde_json::Value;
use std::collections::VecDeque;

/// Override queued with [`Route::next_response`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialResponse {
    pub status: u16,
    pub data: Value,
}

impl SpecialResponse {
    pub fn into_response(self) -> Response {
        Response::json(self.status, &self.data)
    }
}

/// How a route is matched against a request url.
#[derive(Debug, Clone)]
pub enum RouteMatcher {
    Exact(String),
    Pattern(Regex),
}

impl RouteMatcher {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            RouteMatcher::Exact(expected) => expected == url,
            RouteMatcher::Pattern(pattern) => pattern.is_match(url),
        }
    }
}

/// Default behavior of a route when no override is pending.
#[derive(Debug, Clone)]
pub enum RouteAction {
    /// `GET url`: every live record
    Index,
    /// `POST url`: store the body as a new record
    Create,
    /// `GET url/id`
    Show { id: Value },
    /// `PUT url/id`: shallow-merge the body into the record
    Update { id: Value },
    /// `DELETE url/id`
    Destroy { id: Value },
    /// Custom route bound to one record
    Item { id: Value, callback: ItemCallback },
    /// Custom route bound to the collection
    Collection { callback: CollectionCallback },
}

/// Registered route.
///
/// Exact routes are keyed `"METHOD URL"`, pattern routes `"METHOD ~/regex/"`.
#[derive(Debug, Clone)]
pub struct Route {
    key: String,
    method: HttpMethod,
    matcher: RouteMatcher,
    resource: String,
    action: RouteAction,
    special_responses: VecDeque<SpecialResponse>,
}

impl Route {
    pub fn new(
        resource: impl Into<String>,
        method: HttpMethod,
        matcher: RouteMatcher,
        action: RouteAction,
    ) -> Self {
        let key = match &matcher {
            RouteMatcher::Exact(url) => Self::exact_key(method, url),
            RouteMatcher::Pattern(pattern) => format!("{method} ~/{}/", pattern.as_str()),
        };
        Self {
            key,
            method,
            matcher,
            resource: resource.into(),
            action,
            special_responses: VecDeque::new(),
        }
    }

    pub fn exact_key(method: HttpMethod, url: &str) -> String {
        format!("{method} {url}")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    /// Name of the resource owning this route
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &RouteAction {
        &self.action
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.matcher, RouteMatcher::Pattern(_))
    }

    /// Queue a response to be returned instead of the default behavior, once.
    pub fn next_response(&mut self, status: u16, data: Value) {
        self.special_responses
            .push_back(SpecialResponse { status, data });
    }

    pub fn has_special_response(&self) -> bool {
        !self.special_responses.is_empty()
    }

    pub fn pending_responses(&self) -> usize {
        self.special_responses.len()
    }

    pub fn get_special_response(&mut self) -> Option<SpecialResponse> {
        self.special_responses.pop_front()
    }

    /// Take over the overrides still queued on `previous`, ahead of our own.
    pub(crate) fn inherit_responses(&mut self, previous: &mut Route) {
        let mut queued = std::mem::take(&mut previous.special_responses);
        queued.append(&mut self.special_responses);
        self.special_responses = queued;
    }
}
