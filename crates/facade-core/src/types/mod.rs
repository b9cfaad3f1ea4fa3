//! Core request/response types shared by routes, resources and backends.

pub mod method;
pub mod request;
pub mod response;

pub use method::HttpMethod;
pub use request::{Headers, Request};
pub use response::Response;
