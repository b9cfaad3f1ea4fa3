//! Route index grouped by resource, and request-to-route resolution.

use crate::error::FacadeError;
use crate::routes::route::Route;
use crate::types::HttpMethod;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Every registered route, grouped by owning resource name.
///
/// Resources are scanned in registration order, routes within a resource in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    by_resource: IndexMap<String, IndexMap<String, Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a (possibly empty) route table for a resource.
    pub fn add_resource(&mut self, resource: &str) {
        self.by_resource.entry(resource.to_owned()).or_default();
    }

    /// Store a route under its resource, replacing a route with the same key.
    ///
    /// Overrides still queued on the replaced route carry over. Returns the
    /// replaced route, if any.
    pub fn store(&mut self, mut route: Route) -> Option<Route> {
        if !route.is_pattern() {
            let shadowing = self
                .by_resource
                .iter()
                .find(|(name, routes)| *name != route.resource() && routes.contains_key(route.key()))
                .map(|(name, _)| name.clone());
            if let Some(other) = shadowing {
                warn!(
                    route = route.key(),
                    resource = route.resource(),
                    existing = %other,
                    "route key already registered by another resource; the earlier resource wins"
                );
            }
        }

        debug!(route = route.key(), resource = route.resource(), "storing route");
        let routes = self
            .by_resource
            .entry(route.resource().to_owned())
            .or_default();
        if let Some(previous) = routes.get_mut(route.key()) {
            route.inherit_responses(previous);
        }
        routes.insert(route.key().to_owned(), route)
    }

    /// Resolve a request to a route.
    ///
    /// Exact `METHOD URL` keys win over regex routes. Among regex routes the
    /// first one (in scan order) with the same method whose pattern matches
    /// the url is returned.
    pub fn find_route(&self, method: HttpMethod, url: &str) -> Result<&Route, FacadeError> {
        let (resource, index) = self.locate(method, url)?;
        self.by_resource
            .get_index(resource)
            .and_then(|(_, routes)| routes.get_index(index))
            .map(|(_, route)| route)
            .ok_or_else(|| FacadeError::RouteNotFound(Route::exact_key(method, url)))
    }

    pub fn find_route_mut(
        &mut self,
        method: HttpMethod,
        url: &str,
    ) -> Result<&mut Route, FacadeError> {
        let (resource, index) = self.locate(method, url)?;
        self.by_resource
            .get_index_mut(resource)
            .and_then(|(_, routes)| routes.get_index_mut(index))
            .map(|(_, route)| route)
            .ok_or_else(|| FacadeError::RouteNotFound(Route::exact_key(method, url)))
    }

    fn locate(&self, method: HttpMethod, url: &str) -> Result<(usize, usize), FacadeError> {
        let key = Route::exact_key(method, url);

        let exact = self
            .by_resource
            .values()
            .enumerate()
            .find_map(|(r, routes)| routes.get_index_of(&key).map(|i| (r, i)));
        if let Some(found) = exact {
            return Ok(found);
        }

        self.by_resource
            .values()
            .enumerate()
            .find_map(|(r, routes)| {
                routes
                    .values()
                    .position(|route| {
                        route.is_pattern()
                            && route.method() == method
                            && route.matcher().matches(url)
                    })
                    .map(|i| (r, i))
            })
            .ok_or(FacadeError::RouteNotFound(key))
    }

    /// Look up a route by resource name and key.
    pub fn get(&self, resource: &str, key: &str) -> Option<&Route> {
        self.by_resource.get(resource)?.get(key)
    }

    pub fn get_mut(&mut self, resource: &str, key: &str) -> Option<&mut Route> {
        self.by_resource.get_mut(resource)?.get_mut(key)
    }

    /// All routes in resolution scan order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.by_resource.values().flat_map(|routes| routes.values())
    }

    pub fn routes_for<'a>(&'a self, resource: &str) -> impl Iterator<Item = &'a Route> {
        self.by_resource
            .get(resource)
            .into_iter()
            .flat_map(|routes| routes.values())
    }

    pub fn len(&self) -> usize {
        self.by_resource.values().map(|routes| routes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_resource.clear();
    }
}
