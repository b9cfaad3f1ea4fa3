//! Custom route specifications registered through `Resource::add_route`.

use crate::error::FacadeError;
use crate::types::{Headers, HttpMethod};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type ItemFn = dyn Fn(&Value, &mut Value, &Headers) -> Value + Send + Sync;
type CollectionFn = dyn Fn(&Value, &mut Vec<Value>, &Headers) -> Value + Send + Sync;

/// Callback bound to a single record.
///
/// Receives the parsed request body, the stored record (changes are written
/// back) and the request headers. Returns `null` for the default `200` record
/// response, or a `[status, data, headers, statusText]` tuple.
#[derive(Clone)]
pub struct ItemCallback(Arc<ItemFn>);

impl ItemCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &mut Value, &Headers) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, body: &Value, record: &mut Value, headers: &Headers) -> Value {
        (self.0)(body, record, headers)
    }
}

impl fmt::Debug for ItemCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ItemCallback")
    }
}

/// Callback bound to a whole resource collection.
///
/// Receives the parsed request body, every live record (changes are written
/// back by id) and the request headers. Return contract as [`ItemCallback`].
#[derive(Clone)]
pub struct CollectionCallback(Arc<CollectionFn>);

impl CollectionCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &mut Vec<Value>, &Headers) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, body: &Value, records: &mut Vec<Value>, headers: &Headers) -> Value {
        (self.0)(body, records, headers)
    }
}

impl fmt::Debug for CollectionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CollectionCallback")
    }
}

/// Route path: a literal suffix appended to the resource url, or a regex
/// matched against the full request url.
#[derive(Debug, Clone)]
pub enum RoutePath {
    Suffix(String),
    Pattern(Regex),
}

impl From<&str> for RoutePath {
    fn from(suffix: &str) -> Self {
        RoutePath::Suffix(suffix.to_owned())
    }
}

impl From<String> for RoutePath {
    fn from(suffix: String) -> Self {
        RoutePath::Suffix(suffix)
    }
}

impl From<Regex> for RoutePath {
    fn from(pattern: Regex) -> Self {
        RoutePath::Pattern(pattern)
    }
}

/// Validated custom route.
#[derive(Debug, Clone)]
pub enum RouteSpec {
    /// One route per record at `resource_url/id + path`
    Item {
        method: HttpMethod,
        path: String,
        callback: ItemCallback,
    },
    /// One route at `resource_url + path`, or a regex over the full url
    Collection {
        method: HttpMethod,
        path: RoutePath,
        callback: CollectionCallback,
    },
}

impl RouteSpec {
    pub fn on_item<F>(
        method: HttpMethod,
        path: impl Into<String>,
        callback: F,
    ) -> Result<Self, FacadeError>
    where
        F: Fn(&Value, &mut Value, &Headers) -> Value + Send + Sync + 'static,
    {
        RouteOptions {
            method: method.to_string(),
            route: Some(RoutePath::Suffix(path.into())),
            callback: Some(RouteCallback::Item(ItemCallback::new(callback))),
            on_item: true,
        }
        .try_into()
    }

    pub fn on_collection<F>(
        method: HttpMethod,
        path: impl Into<RoutePath>,
        callback: F,
    ) -> Result<Self, FacadeError>
    where
        F: Fn(&Value, &mut Vec<Value>, &Headers) -> Value + Send + Sync + 'static,
    {
        RouteOptions {
            method: method.to_string(),
            route: Some(path.into()),
            callback: Some(RouteCallback::Collection(CollectionCallback::new(callback))),
            on_item: false,
        }
        .try_into()
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            RouteSpec::Item { method, .. } | RouteSpec::Collection { method, .. } => *method,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, RouteSpec::Item { .. })
    }
}

/// Either kind of custom route callback.
#[derive(Debug, Clone)]
pub enum RouteCallback {
    Item(ItemCallback),
    Collection(CollectionCallback),
}

/// Loosely typed route options, validated into a [`RouteSpec`].
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub method: String,
    pub route: Option<RoutePath>,
    pub callback: Option<RouteCallback>,
    pub on_item: bool,
}

impl TryFrom<RouteOptions> for RouteSpec {
    type Error = FacadeError;

    fn try_from(options: RouteOptions) -> Result<Self, Self::Error> {
        let method: HttpMethod = options.method.parse()?;

        let route = match options.route {
            Some(RoutePath::Suffix(suffix)) if suffix.is_empty() => None,
            other => other,
        }
        .ok_or_else(|| FacadeError::validation("You must supply a route. eg: '/my_route'"))?;

        let callback = options.callback.ok_or_else(|| {
            FacadeError::validation(format!(
                "You must supply a callback for the custom route {method}"
            ))
        })?;

        match (options.on_item, route, callback) {
            (true, RoutePath::Suffix(path), RouteCallback::Item(callback)) => Ok(RouteSpec::Item {
                method,
                path,
                callback,
            }),
            (true, RoutePath::Pattern(pattern), _) => Err(FacadeError::validation(format!(
                "Item routes cannot use a regex pattern ({pattern})"
            ))),
            (false, path, RouteCallback::Collection(callback)) => Ok(RouteSpec::Collection {
                method,
                path,
                callback,
            }),
            (true, _, RouteCallback::Collection(_)) => Err(FacadeError::validation(
                "Item routes need an item callback",
            )),
            (false, _, RouteCallback::Item(_)) => Err(FacadeError::validation(
                "Collection routes need a collection callback",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;
    use serde_json::json;

    fn item_callback() -> RouteCallback {
        RouteCallback::Item(ItemCallback::new(|_, record, _| {
            record["verified"] = json!(true);
            Value::Null
        }))
    }

    fn collection_callback() -> RouteCallback {
        RouteCallback::Collection(CollectionCallback::new(|_, _, _| Value::Null))
    }

    #[rstest]
    fn test_on_item_valid() {
        let spec = RouteSpec::on_item(HttpMethod::Post, "/verify", |_, _, _| Value::Null).unwrap();
        assert!(spec.is_item());
        assert_eq!(spec.method(), HttpMethod::Post);
    }

    #[rstest]
    fn test_on_collection_accepts_regex() {
        let pattern = Regex::new(r"^/api/search/\w+$").unwrap();
        let spec =
            RouteSpec::on_collection(HttpMethod::Get, pattern, |_, _, _| Value::Null).unwrap();
        assert!(matches!(
            spec,
            RouteSpec::Collection {
                path: RoutePath::Pattern(_),
                ..
            }
        ));
    }

    #[rstest]
    #[case("FETCH", Some(RoutePath::from("/verify")), Some(item_callback()), true, "not a valid HTTP method")]
    #[case("POST", None, Some(item_callback()), true, "must supply a route")]
    #[case("POST", Some(RoutePath::from("")), Some(collection_callback()), false, "must supply a route")]
    #[case("POST", Some(RoutePath::from("/verify")), None, false, "must supply a callback")]
    #[case("POST", Some(RoutePath::from(Regex::new("verify").unwrap())), Some(item_callback()), true, "cannot use a regex")]
    #[case("POST", Some(RoutePath::from("/verify")), Some(collection_callback()), true, "item callback")]
    #[case("POST", Some(RoutePath::from("/verify")), Some(item_callback()), false, "collection callback")]
    fn test_invalid_options(
        #[case] method: &str,
        #[case] route: Option<RoutePath>,
        #[case] callback: Option<RouteCallback>,
        #[case] on_item: bool,
        #[case] message: &str,
    ) {
        let options = RouteOptions {
            method: method.to_string(),
            route,
            callback,
            on_item,
        };
        let err = RouteSpec::try_from(options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(
            err.to_string().contains(message),
            "'{}' should mention '{}'",
            err,
            message
        );
    }

    #[rstest]
    fn test_item_callback_mutates_record() {
        let RouteCallback::Item(callback) = item_callback() else {
            unreachable!()
        };
        let mut record = json!({"id": 1, "verified": false});
        let result = callback.call(&json!({}), &mut record, &Headers::new());
        assert_eq!(result, Value::Null);
        assert_eq!(record["verified"], true);
    }
}
