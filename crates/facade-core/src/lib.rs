//! In-memory REST backend for front-end tests.
//!
//! Declare [`Resource`]s on a [`Registry`], seed them with records, and call
//! [`Registry::initialize`] with a [`Backend`] adapter. Every resource then
//! answers the standard collection and item routes (`GET`/`POST url`,
//! `GET`/`PUT`/`DELETE url/id`) from its in-memory table, plus any custom
//! routes added with [`Resource::add_route`]. One-shot overrides queued with
//! [`RouteHandle::next_response`] preempt a route's default behavior.
//!
//! [`MockBackend`] is a ready-made adapter that queues requests until
//! `flush`, which is enough to drive the registry from plain Rust tests.

pub mod backend;
pub mod config;
pub mod error;
pub mod expression;
pub mod matching;
pub mod registry;
pub mod resource;
pub mod routes;
pub mod store;
pub mod types;

pub use backend::{Backend, MockBackend, UrlPattern};
pub use error::{ErrorKind, FacadeError};
pub use registry::{InitOptions, Registry, RouteHandle};
pub use resource::{ExpectationBuilder, Resource, ResourceOptions};
pub use routes::{RouteOptions, RoutePath, RouteSpec};
pub use types::{Headers, HttpMethod, Request, Response};
