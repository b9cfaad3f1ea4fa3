//! Routes, custom route specs and the route registry.
//!
//! - [`Route`]: one `(method, url-or-pattern)` entry with its override queue
//! - [`RouteRegistry`]: all routes grouped by resource, with `find_route`
//! - [`RouteSpec`]: validated custom route declared on a resource

pub mod registry;
pub mod route;
pub mod spec;

pub use registry::RouteRegistry;
pub use route::{Route, RouteAction, RouteMatcher, SpecialResponse};
pub use spec::{CollectionCallback, ItemCallback, RouteCallback, RouteOptions, RoutePath, RouteSpec};
