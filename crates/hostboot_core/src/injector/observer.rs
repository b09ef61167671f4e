//! Injection observers.

use super::namespace::NamespaceHandle;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Listener notified synchronously after every successful injection.
pub trait InjectionObserver: Send + Sync {
    fn on_injected(&self, namespace: &NamespaceHandle, path: &Path, external: bool);
}

impl<F> InjectionObserver for F
where
    F: Fn(&NamespaceHandle, &Path, bool) + Send + Sync,
{
    fn on_injected(&self, namespace: &NamespaceHandle, path: &Path, external: bool) {
        self(namespace, path, external)
    }
}

/// Records first-party additions; external paths are skipped.
#[derive(Debug, Default)]
pub struct AdditionsLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

/// One first-party injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub path: PathBuf,
    pub namespace: String,
}

impl AdditionsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|entry| entry.path == path)
    }
}

impl InjectionObserver for AdditionsLedger {
    fn on_injected(&self, namespace: &NamespaceHandle, path: &Path, external: bool) {
        if external {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LedgerEntry {
                path: path.to_path_buf(),
                namespace: namespace.name().to_string(),
            });
    }
}
