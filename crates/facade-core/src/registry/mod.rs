//! The registry facade: resources, routes, lifecycle and dispatch.
//!
//! A [`Registry`] is an explicit, cloneable handle. Setup code registers
//! resources on it, [`Registry::initialize`] wires every resource's routes to
//! a [`Backend`], and [`Registry::reset`] / [`Registry::clear`] restore or
//! wipe state between test cases.

mod dispatch;
mod materialize;

use crate::backend::{Backend, BodyMatcher, UrlPattern};
use crate::config::ResourceFixture;
use crate::error::FacadeError;
use crate::resource::{Resource, ResourceDef, ResourceOptions};
use crate::routes::{RouteRegistry, RouteSpec};
use crate::store::Table;
use crate::types::{HttpMethod, Request, Response};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};

pub(crate) type Shared = Arc<Mutex<Inner>>;
pub(crate) type WeakShared = Weak<Mutex<Inner>>;

/// Setup callback run on every [`Registry::initialize`].
pub type DefineCallback = Arc<dyn Fn(&Registry) -> Result<(), FacadeError> + Send + Sync>;

pub(crate) fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resources, tables and routes: everything `initialize` snapshots.
#[derive(Clone, Default)]
pub(crate) struct WorldState {
    pub(crate) resources: IndexMap<String, ResourceDef>,
    pub(crate) tables: IndexMap<String, Table>,
    pub(crate) routes: RouteRegistry,
}

impl WorldState {
    pub(crate) fn resource(&self, name: &str) -> Result<&ResourceDef, FacadeError> {
        self.resources.get(name).ok_or_else(|| unknown_resource(name))
    }

    pub(crate) fn table(&self, name: &str) -> Result<&Table, FacadeError> {
        self.tables.get(name).ok_or_else(|| unknown_resource(name))
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Result<&mut Table, FacadeError> {
        self.tables.get_mut(name).ok_or_else(|| unknown_resource(name))
    }
}

fn unknown_resource(name: &str) -> FacadeError {
    FacadeError::not_found(format!("There is no resource named {name}"))
}

#[derive(Default)]
pub(crate) struct Inner {
    pub(crate) world: WorldState,
    baseline: Option<Arc<WorldState>>,
    pub(crate) initialized: bool,
    pub(crate) backend: Option<Arc<dyn Backend>>,
    /// Route keys already registered on the current backend; kept across `reset`
    pub(crate) wired: HashSet<String>,
    define: Option<DefineCallback>,
}

impl Inner {
    pub(crate) fn backend(&self) -> Result<Arc<dyn Backend>, FacadeError> {
        self.backend.clone().ok_or(FacadeError::BackendNotDetected)
    }

    fn replace_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backend = Some(backend);
        self.wired.clear();
    }

    /// Validate and store a resource, returning its name and url.
    pub(crate) fn register_resource(
        &mut self,
        weak: &WeakShared,
        options: ResourceOptions,
    ) -> Result<(String, String), FacadeError> {
        if options.name.is_empty() {
            return Err(FacadeError::validation(
                "You must provide a name for the resource",
            ));
        }
        if options.url.is_empty() {
            return Err(FacadeError::validation(format!(
                "You must provide a url for the resource {}",
                options.name
            )));
        }
        if self.world.resources.contains_key(&options.name) {
            return Err(FacadeError::Conflict(format!(
                "A resource named {} already exists",
                options.name
            )));
        }
        if let Some(other) = self
            .world
            .resources
            .values()
            .find(|def| def.url == options.url)
        {
            return Err(FacadeError::Conflict(format!(
                "The url {} is already taken by the {} resource",
                options.url, other.name
            )));
        }

        let name = options.name.clone();
        let url = options.url.clone();
        debug!(resource = %name, %url, "registering resource");
        self.world
            .tables
            .insert(name.clone(), Table::new(name.clone()));
        self.world.routes.add_resource(&name);
        self.world
            .resources
            .insert(name.clone(), ResourceDef::new(options));

        if self.initialized {
            self.materialize_resource(weak, &name)?;
        }
        Ok((name, url))
    }

    pub(crate) fn add_item(
        &mut self,
        weak: &WeakShared,
        resource: &str,
        record: Value,
    ) -> Result<Value, FacadeError> {
        self.world.table_mut(resource)?.create(record.clone())?;
        if self.initialized {
            self.materialize_item(weak, resource, &record)?;
        }
        Ok(record)
    }

    pub(crate) fn add_route(
        &mut self,
        weak: &WeakShared,
        resource: &str,
        spec: RouteSpec,
    ) -> Result<(), FacadeError> {
        self.world
            .resources
            .get_mut(resource)
            .ok_or_else(|| unknown_resource(resource))?
            .custom_routes
            .push(spec.clone());
        if self.initialized {
            self.materialize_spec(weak, resource, &spec)?;
        }
        Ok(())
    }

    pub(crate) fn register_expectation(
        &self,
        weak: &WeakShared,
        method: HttpMethod,
        url: &str,
        matcher: BodyMatcher,
    ) -> Result<(), FacadeError> {
        let backend = self.backend()?;
        debug!(%method, %url, "registering expectation");
        backend.expect(
            method,
            UrlPattern::exact(url),
            matcher,
            dispatch::route_handler(weak.clone()),
        );
        Ok(())
    }
}

/// Options for [`Registry::initialize`].
#[derive(Clone, Default)]
pub struct InitOptions {
    /// Replaces any backend set earlier with [`Registry::set_backend`] or a
    /// previous `initialize`. Leave it `None` to keep the current backend.
    pub backend: Option<Arc<dyn Backend>>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }
}

/// In-memory REST backend for tests.
#[derive(Clone, Default)]
pub struct Registry {
    shared: Shared,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Registry")
            .field("resources", &inner.world.resources.len())
            .field("routes", &inner.world.routes.len())
            .field("initialized", &inner.initialized)
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.shared)
    }

    fn weak(&self) -> WeakShared {
        Arc::downgrade(&self.shared)
    }

    /// Register a top-level resource.
    pub fn resource(&self, options: ResourceOptions) -> Result<Resource, FacadeError> {
        let (name, url) = self.lock().register_resource(&self.weak(), options)?;
        Ok(Resource::new(name, url, Arc::clone(&self.shared)))
    }

    pub fn get_resource(&self, name: &str) -> Result<Resource, FacadeError> {
        let url = self.lock().world.resource(name)?.url.clone();
        Ok(Resource::new(name.to_owned(), url, Arc::clone(&self.shared)))
    }

    /// Names of every registered resource, in registration order.
    pub fn resource_names(&self) -> Vec<String> {
        self.lock().world.resources.keys().cloned().collect()
    }

    pub fn set_backend(&self, backend: Arc<dyn Backend>) {
        self.lock().replace_backend(backend);
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Store a setup callback run on every `initialize`.
    pub fn define<F>(&self, callback: F)
    where
        F: Fn(&Registry) -> Result<(), FacadeError> + Send + Sync + 'static,
    {
        info!("storing define callback");
        self.lock().define = Some(Arc::new(callback));
    }

    pub fn undefine(&self) {
        info!("removing define callback");
        self.lock().define = None;
    }

    /// Wire every resource to the backend and snapshot the result.
    ///
    /// Runs the define callback first. Fails with
    /// [`FacadeError::BackendNotDetected`] when no backend was passed or set.
    pub fn initialize(&self, options: InitOptions) -> Result<(), FacadeError> {
        let define = {
            let mut inner = self.lock();
            if let Some(backend) = options.backend {
                inner.replace_backend(backend);
            }
            inner.backend()?;
            inner.define.clone()
        };
        if let Some(define) = define {
            define(self)?;
        }

        let weak = self.weak();
        let mut inner = self.lock();
        let names: Vec<String> = inner.world.resources.keys().cloned().collect();
        for name in &names {
            inner.materialize_resource(&weak, name)?;
        }
        inner.initialized = true;
        inner.baseline = Some(Arc::new(inner.world.clone()));
        info!(
            resources = names.len(),
            routes = inner.world.routes.len(),
            "registry initialized"
        );
        Ok(())
    }

    /// Restore resources, tables and routes from the last `initialize`.
    ///
    /// Backend definitions stay registered; their handlers resolve against
    /// the restored routes, and a following `initialize` without a new
    /// backend does not register them again.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.world = inner
            .baseline
            .as_deref()
            .cloned()
            .unwrap_or_default();
        inner.initialized = false;
        info!(resources = inner.world.resources.len(), "registry reset");
    }

    /// Drop every resource, table, route, the snapshot and the backend.
    ///
    /// The define callback survives; use [`undefine`](Self::undefine) to drop it.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.world = WorldState::default();
        inner.baseline = None;
        inner.backend = None;
        inner.wired.clear();
        inner.initialized = false;
        info!("registry cleared");
    }

    /// Find the route a request would resolve to.
    pub fn find_route(&self, method: HttpMethod, url: &str) -> Result<RouteHandle, FacadeError> {
        let inner = self.lock();
        let route = inner.world.routes.find_route(method, url)?;
        Ok(RouteHandle {
            shared: Arc::clone(&self.shared),
            resource: route.resource().to_owned(),
            key: route.key().to_owned(),
        })
    }

    /// Every route key in resolution scan order.
    pub fn route_keys(&self) -> Vec<String> {
        self.lock()
            .world
            .routes
            .routes()
            .map(|route| route.key().to_owned())
            .collect()
    }

    /// Answer a request directly, as a backend handler would.
    pub fn handle(&self, request: &Request) -> Result<Response, FacadeError> {
        dispatch::dispatch(&self.shared, request)
    }

    /// Register resources, children and seed records from fixtures.
    pub fn load_fixtures(&self, fixtures: &[ResourceFixture]) -> Result<Vec<Resource>, FacadeError> {
        fixtures
            .iter()
            .map(|fixture| {
                let resource =
                    self.resource(ResourceOptions::new(&fixture.name, &fixture.url))?;
                seed_fixture(&resource, fixture)?;
                Ok(resource)
            })
            .collect()
    }
}

fn seed_fixture(resource: &Resource, fixture: &ResourceFixture) -> Result<(), FacadeError> {
    for item in &fixture.items {
        resource.add_item(item.clone())?;
    }
    for child in &fixture.resources {
        let nested = resource.resource(ResourceOptions::new(&child.name, &child.url))?;
        seed_fixture(&nested, child)?;
    }
    Ok(())
}

/// Handle to a registered route, used to queue one-shot overrides.
#[derive(Clone)]
pub struct RouteHandle {
    shared: Shared,
    resource: String,
    key: String,
}

impl fmt::Debug for RouteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandle")
            .field("resource", &self.resource)
            .field("key", &self.key)
            .finish()
    }
}

impl RouteHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Answer the next request on this route with `status` and `data`
    /// instead of its default behavior. Overrides queue up and are used in
    /// order, once each.
    pub fn next_response(&self, status: u16, data: Value) -> Result<(), FacadeError> {
        let mut inner = lock(&self.shared);
        inner
            .world
            .routes
            .get_mut(&self.resource, &self.key)
            .ok_or_else(|| FacadeError::RouteNotFound(self.key.clone()))?
            .next_response(status, data);
        Ok(())
    }

    pub fn has_special_response(&self) -> bool {
        lock(&self.shared)
            .world
            .routes
            .get(&self.resource, &self.key)
            .is_some_and(|route| route.has_special_response())
    }
}
