//! Body matching used by backend expectations.

pub mod payload;

pub use payload::{body_contains, value_intersects};
