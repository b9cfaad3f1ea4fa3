//! Fixture files: resources and seed records declared in YAML, JSON or JSONC.

pub mod error;
pub mod fixture;
pub mod loader;
pub mod parser;

pub use error::ConfigError;
pub use fixture::ResourceFixture;
pub use loader::load_fixtures;
