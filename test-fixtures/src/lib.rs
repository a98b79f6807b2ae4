//! Test doubles and fixture loading for Conclave test suites.
//!
//! - [`ScriptedDispatcher`]: agent dispatcher driven by per-agent scripts.
//! - [`FlakySessionStore`] / [`UnavailableMemoryStore`]: failing store doubles.
//! - [`builders`]: short constructors for inputs, agents, findings and configs.
//! - Golden JSON fixtures under `golden/`.

pub mod builders;
pub mod dispatcher;
pub mod stores;

pub use dispatcher::{Invocation, ScriptedDispatcher, Step};
pub use stores::{FlakySessionStore, UnavailableMemoryStore};

use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Root of the golden fixture tree.
fn golden_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a golden JSON fixture.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = golden_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    golden_root().join(relative_path).exists()
}

/// List all JSON files in a fixture subdirectory, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = golden_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|ext| ext == "json").then_some(path)
        })
        .collect();
    files.sort();
    files
}
