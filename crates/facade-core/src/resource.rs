//! Resource definitions and the handle tests use to seed and inspect them.

use crate::backend::BodyMatcher;
use crate::error::FacadeError;
use crate::expression::{raw_body_matches_expression, validate_expression};
use crate::matching::payload::raw_body_contains;
use crate::registry::{lock, Shared};
use crate::routes::RouteSpec;
use crate::store::table::id_segment;
use crate::types::HttpMethod;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Factory that turns a POST payload without an id into a storable record.
pub type CreateDefault = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Options for registering a resource.
///
/// For a child resource `url` is the suffix appended to the parent url.
#[derive(Clone, Default)]
pub struct ResourceOptions {
    pub name: String,
    pub url: String,
    pub create_default: Option<CreateDefault>,
}

impl ResourceOptions {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            create_default: None,
        }
    }

    pub fn with_default<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.create_default = Some(Arc::new(factory));
        self
    }
}

impl fmt::Debug for ResourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceOptions")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("create_default", &self.create_default.is_some())
            .finish()
    }
}

/// Registered resource as held in world state.
#[derive(Clone)]
pub(crate) struct ResourceDef {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) create_default: Option<CreateDefault>,
    /// Custom routes in registration order, replayed for late-added records
    pub(crate) custom_routes: Vec<RouteSpec>,
}

impl ResourceDef {
    pub(crate) fn new(options: ResourceOptions) -> Self {
        Self {
            name: options.name,
            url: options.url,
            create_default: options.create_default,
            custom_routes: Vec::new(),
        }
    }

    pub(crate) fn item_url(&self, id: &Value) -> String {
        format!("{}/{}", self.url, id_segment(id))
    }
}

/// Handle to a registered resource.
///
/// Every operation goes through the owning registry, so a handle taken before
/// `reset` sees the restored state and a handle taken before `clear` fails
/// with `NotFound`.
#[derive(Clone)]
pub struct Resource {
    name: String,
    url: String,
    shared: Shared,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

impl Resource {
    pub(crate) fn new(name: String, url: String, shared: Shared) -> Self {
        Self { name, url, shared }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL of the item route for `id`.
    pub fn show_url(&self, id: &Value) -> String {
        format!("{}/{}", self.url, id_segment(id))
    }

    /// Store a record. Once the registry is initialized the record's item
    /// routes, including earlier custom item routes, are registered at once.
    pub fn add_item(&self, record: Value) -> Result<Value, FacadeError> {
        lock(&self.shared).add_item(&Arc::downgrade(&self.shared), &self.name, record)
    }

    /// Store every record of a JSON array.
    pub fn add_items(&self, records: Value) -> Result<Vec<Value>, FacadeError> {
        let Value::Array(records) = records else {
            return Err(FacadeError::validation(format!(
                "add_items for {} expects an array of records",
                self.name
            )));
        };
        records
            .into_iter()
            .map(|record| self.add_item(record))
            .collect()
    }

    /// Register a child resource whose url is this url plus `options.url`.
    pub fn resource(&self, options: ResourceOptions) -> Result<Resource, FacadeError> {
        if options.url.is_empty() {
            return Err(FacadeError::validation(format!(
                "You must provide a url for the resource {}",
                options.name
            )));
        }
        let options = ResourceOptions {
            url: format!("{}{}", self.url, options.url),
            ..options
        };
        let (name, url) =
            lock(&self.shared).register_resource(&Arc::downgrade(&self.shared), options)?;
        Ok(Resource::new(name, url, Arc::clone(&self.shared)))
    }

    /// Register a custom route.
    ///
    /// The route is kept on the resource and materialized now if the registry
    /// is initialized, otherwise on the next `initialize`.
    pub fn add_route(&self, spec: RouteSpec) -> Result<(), FacadeError> {
        lock(&self.shared).add_route(&Arc::downgrade(&self.shared), &self.name, spec)
    }

    pub fn find(&self, id: &Value) -> Result<Value, FacadeError> {
        let inner = lock(&self.shared);
        inner.world.table(&self.name)?.find(id).cloned()
    }

    /// Every live record in insertion order.
    pub fn all(&self) -> Result<Vec<Value>, FacadeError> {
        Ok(lock(&self.shared).world.table(&self.name)?.get_all())
    }

    pub fn delete(&self, id: &Value) -> Result<Value, FacadeError> {
        lock(&self.shared).world.table_mut(&self.name)?.delete(id)
    }

    /// Mutate a stored record in place and return the result.
    pub fn update<F>(&self, id: &Value, f: F) -> Result<Value, FacadeError>
    where
        F: FnOnce(&mut Value),
    {
        let mut inner = lock(&self.shared);
        let record = inner.world.table_mut(&self.name)?.find_mut(id)?;
        f(&mut *record);
        Ok(record.clone())
    }

    /// Start a strict expectation for `method` on this url plus `route`.
    pub fn expect(&self, method: HttpMethod, route: &str) -> ExpectationBuilder {
        ExpectationBuilder {
            shared: Arc::clone(&self.shared),
            method,
            url: format!("{}{}", self.url, route),
        }
    }
}

/// Pending expectation created by [`Resource::expect`].
pub struct ExpectationBuilder {
    shared: Shared,
    method: HttpMethod,
    url: String,
}

impl ExpectationBuilder {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Require every key/value pair of `params` to appear somewhere in the
    /// JSON body, at any depth.
    pub fn with(self, params: Value) -> Result<(), FacadeError> {
        let Value::Object(expected) = params else {
            return Err(FacadeError::validation(
                "expected params must be a JSON object",
            ));
        };
        self.register(Arc::new(move |raw: Option<&str>| {
            raw_body_contains(raw, &expected)
        }))
    }

    /// Require the JSON body to make a JMESPath expression truthy.
    pub fn with_expression(self, expression: &str) -> Result<(), FacadeError> {
        validate_expression(expression)?;
        let expression = expression.to_owned();
        self.register(Arc::new(move |raw: Option<&str>| {
            raw_body_matches_expression(raw, &expression)
        }))
    }

    fn register(self, matcher: BodyMatcher) -> Result<(), FacadeError> {
        lock(&self.shared).register_expectation(
            &Arc::downgrade(&self.shared),
            self.method,
            &self.url,
            matcher,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_options_with_default() {
        let options = ResourceOptions::new("patient", "/api/patients")
            .with_default(|payload| json!({"id": 99, "payload": payload}));
        let factory = options.create_default.clone().unwrap();
        assert_eq!(factory(&json!({"a": 1}))["id"], json!(99));
        assert_eq!(
            format!("{options:?}"),
            r#"ResourceOptions { name: "patient", url: "/api/patients", create_default: true }"#
        );
    }

    #[rstest]
    #[case(json!(1), "/api/patients/1")]
    #[case(json!("abc"), "/api/patients/abc")]
    fn test_item_url(#[case] id: Value, #[case] expected: &str) {
        let def = ResourceDef::new(ResourceOptions::new("patient", "/api/patients"));
        assert_eq!(def.item_url(&id), expected);
    }
}
