//! Loading fixture files from disk.

use crate::config::error::ConfigError;
use crate::config::fixture::{FixtureFile, ResourceFixture};
use crate::config::parser::parse_file;
use std::path::PathBuf;
use tracing::debug;

/// Read every file matching `pattern` (in sorted path order) and collect
/// their fixtures.
///
/// A plain path is a pattern matching itself. A pattern matching nothing
/// yields no fixtures.
pub async fn load_fixtures(pattern: &str) -> Result<Vec<ResourceFixture>, ConfigError> {
    let mut paths = glob::glob(pattern)?.collect::<Result<Vec<PathBuf>, _>>()?;
    paths.sort();

    let mut fixtures = Vec::new();
    for path in paths {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let file: FixtureFile = parse_file(&content, &path)?;
        let loaded = file.into_vec();
        debug!(path = %path.display(), fixtures = loaded.len(), "loaded fixture file");
        fixtures.extend(loaded);
    }
    Ok(fixtures)
}
