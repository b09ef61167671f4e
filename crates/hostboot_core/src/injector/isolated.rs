//! Process-wide isolated namespace.
//!
//! Keeps injected code out of the host's primary container. Only the entry
//! point the injector needs and a minimal unit lookup live here.

use crate::resolution::{ResolveError, ResolveResult, ResolvedUnit};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// File extension of a resolvable unit inside a namespace directory.
pub const UNIT_EXTENSION: &str = "unit";

/// Name reported for the isolated namespace in handles and log events.
pub const ISOLATED_NAMESPACE_NAME: &str = "isolated";

/// Private resolution scope; paths accumulate across injections.
#[derive(Debug, Default)]
pub struct IsolatedNamespace {
    paths: RwLock<Vec<PathBuf>>,
}

impl IsolatedNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path`; duplicates are kept.
    pub fn add_path(&self, path: &Path) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
    }

    /// Snapshot of the paths added so far, in insertion order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves `a.b.C` to the first `a/b/C.unit` found under a directory path.
    pub fn resolve(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        let relative = unit_relative_path(name);
        let paths = self.paths.read().unwrap_or_else(PoisonError::into_inner);
        paths
            .iter()
            .filter(|root| root.is_dir())
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
            .map(|origin| ResolvedUnit {
                name: name.to_string(),
                origin: Some(origin),
                initialized: initialize,
            })
            .ok_or_else(|| ResolveError::NotFound {
                name: name.to_string(),
                namespace: ISOLATED_NAMESPACE_NAME.to_string(),
            })
    }
}

fn unit_relative_path(name: &str) -> PathBuf {
    let mut relative: PathBuf = name.split('.').collect();
    relative.set_extension(UNIT_EXTENSION);
    relative
}

#[cfg(test)]
mod tests {
    use super::{unit_relative_path, IsolatedNamespace};
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn maps_dotted_name_to_unit_file() {
        assert_eq!(
            unit_relative_path("app.core.Entry"),
            PathBuf::from("app/core/Entry.unit")
        );
    }

    #[test]
    fn resolves_units_across_accumulated_paths() {
        let first = tempfile::tempdir().expect("first dir");
        let second = tempfile::tempdir().expect("second dir");
        fs::create_dir_all(second.path().join("app")).expect("unit dir");
        fs::write(second.path().join("app/Entry.unit"), b"").expect("unit file");

        let namespace = IsolatedNamespace::new();
        namespace.add_path(first.path());
        assert!(namespace.resolve("app.Entry", false).is_err());

        namespace.add_path(second.path());
        namespace.add_path(second.path());
        let unit = namespace
            .resolve("app.Entry", true)
            .expect("unit under second path");
        assert_eq!(unit.origin, Some(second.path().join("app/Entry.unit")));
        assert!(unit.initialized);
        assert_eq!(namespace.paths().len(), 3);
    }
}
