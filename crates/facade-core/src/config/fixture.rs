//! Resource fixtures as declared in fixture files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resource, its seed records and nested child resources.
///
/// A child's `url` is relative to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFixture {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub resources: Vec<ResourceFixture>,
}

/// A fixture file holds either one fixture or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FixtureFile {
    Many(Vec<ResourceFixture>),
    One(ResourceFixture),
}

impl FixtureFile {
    pub(crate) fn into_vec(self) -> Vec<ResourceFixture> {
        match self {
            FixtureFile::Many(fixtures) => fixtures,
            FixtureFile::One(fixture) => vec![fixture],
        }
    }
}
