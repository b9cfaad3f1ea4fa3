//! Turning resources and route specs into registered routes.

use super::dispatch::route_handler;
use super::{Inner, WeakShared};
use crate::backend::UrlPattern;
use crate::error::FacadeError;
use crate::routes::{Route, RouteAction, RouteMatcher, RoutePath, RouteSpec};
use crate::store::table::{missing_record_id, record_id};
use crate::types::HttpMethod;
use serde_json::Value;
use tracing::debug;

impl Inner {
    /// Store a route and register a handler for it on the backend.
    ///
    /// A key the backend already answers is not registered twice: every
    /// handler resolves through the registry, so the existing one serves the
    /// new route too.
    fn register_route(&mut self, weak: &WeakShared, route: Route) -> Result<(), FacadeError> {
        let backend = self.backend()?;
        if self.wired.insert(route.key().to_owned()) {
            let handler = route_handler(weak.clone());
            let method = route.method();
            match route.matcher() {
                RouteMatcher::Exact(url) => match method {
                    HttpMethod::Get => backend.when_get(url, handler),
                    HttpMethod::Post => backend.when_post(url, handler),
                    HttpMethod::Put => backend.when_put(url, handler),
                    HttpMethod::Delete => backend.when_delete(url, handler),
                    other => backend.when(other, UrlPattern::exact(url.as_str()), handler),
                },
                RouteMatcher::Pattern(pattern) => {
                    backend.when(method, UrlPattern::Regex(pattern.clone()), handler)
                }
            }
            debug!(route = route.key(), resource = route.resource(), "route registered");
        }
        self.world.routes.store(route);
        Ok(())
    }

    /// Collection routes, every live record's item routes, then the
    /// resource's custom collection routes.
    pub(crate) fn materialize_resource(
        &mut self,
        weak: &WeakShared,
        resource: &str,
    ) -> Result<(), FacadeError> {
        let def = self.world.resource(resource)?.clone();

        for (method, action) in [
            (HttpMethod::Post, RouteAction::Create),
            (HttpMethod::Get, RouteAction::Index),
        ] {
            let matcher = RouteMatcher::Exact(def.url.clone());
            self.register_route(weak, Route::new(resource, method, matcher, action))?;
        }

        for record in self.world.table(resource)?.get_all() {
            self.materialize_item(weak, resource, &record)?;
        }

        for spec in def.custom_routes.iter().filter(|spec| !spec.is_item()) {
            self.materialize_spec(weak, resource, spec)?;
        }
        Ok(())
    }

    /// Standard item routes for one record plus every custom item route of
    /// its resource, in registration order.
    pub(crate) fn materialize_item(
        &mut self,
        weak: &WeakShared,
        resource: &str,
        record: &Value,
    ) -> Result<(), FacadeError> {
        let id = record_id(record).ok_or_else(missing_record_id)?.clone();
        let def = self.world.resource(resource)?.clone();
        let item_url = def.item_url(&id);

        for (method, action) in [
            (HttpMethod::Get, RouteAction::Show { id: id.clone() }),
            (HttpMethod::Put, RouteAction::Update { id: id.clone() }),
            (HttpMethod::Delete, RouteAction::Destroy { id: id.clone() }),
        ] {
            let matcher = RouteMatcher::Exact(item_url.clone());
            self.register_route(weak, Route::new(resource, method, matcher, action))?;
        }

        for spec in &def.custom_routes {
            if let RouteSpec::Item {
                method,
                path,
                callback,
            } = spec
            {
                let matcher = RouteMatcher::Exact(format!("{item_url}{path}"));
                let action = RouteAction::Item {
                    id: id.clone(),
                    callback: callback.clone(),
                };
                self.register_route(weak, Route::new(resource, *method, matcher, action))?;
            }
        }
        Ok(())
    }

    /// Register one custom route: per live record for item routes, once for
    /// collection routes.
    pub(crate) fn materialize_spec(
        &mut self,
        weak: &WeakShared,
        resource: &str,
        spec: &RouteSpec,
    ) -> Result<(), FacadeError> {
        let def = self.world.resource(resource)?.clone();
        match spec {
            RouteSpec::Item {
                method,
                path,
                callback,
            } => {
                for record in self.world.table(resource)?.get_all() {
                    let id = record_id(&record).ok_or_else(missing_record_id)?.clone();
                    let matcher = RouteMatcher::Exact(format!("{}{path}", def.item_url(&id)));
                    let action = RouteAction::Item {
                        id,
                        callback: callback.clone(),
                    };
                    self.register_route(weak, Route::new(resource, *method, matcher, action))?;
                }
            }
            RouteSpec::Collection {
                method,
                path,
                callback,
            } => {
                let matcher = match path {
                    RoutePath::Suffix(suffix) => RouteMatcher::Exact(format!("{}{suffix}", def.url)),
                    RoutePath::Pattern(pattern) => RouteMatcher::Pattern(pattern.clone()),
                };
                let action = RouteAction::Collection {
                    callback: callback.clone(),
                };
                self.register_route(weak, Route::new(resource, *method, matcher, action))?;
            }
        }
        Ok(())
    }
}
