//! Swappable symbolic-name resolution.
//!
//! All internal lookups go through [`ResolutionIndirection`] so a host adapter
//! can install a strategy that matches how its host rewrites resolution calls.

use crate::injector::NamespaceHandle;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

static SYMBOL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("valid symbol name regex")
});

pub type ResolveResult<T> = Result<T, ResolveError>;

/// A unit of code a symbolic name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub name: String,
    /// Location the unit was loaded from, when the namespace knows it.
    pub origin: Option<PathBuf>,
    pub initialized: bool,
}

/// Strategy turning a symbolic name into a loaded unit.
pub trait UnitFinder: Send + Sync {
    /// Resolves and initializes `name` in the ambient context.
    fn find(&self, name: &str) -> ResolveResult<ResolvedUnit>;

    fn find_initialized(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit>;

    fn find_in(
        &self,
        name: &str,
        initialize: bool,
        context: &NamespaceHandle,
    ) -> ResolveResult<ResolvedUnit>;
}

/// Default strategy: resolves directly against a fixed ambient namespace.
#[derive(Debug, Clone)]
pub struct DirectFinder {
    ambient: NamespaceHandle,
}

impl DirectFinder {
    pub fn new(ambient: NamespaceHandle) -> Self {
        Self { ambient }
    }
}

impl UnitFinder for DirectFinder {
    fn find(&self, name: &str) -> ResolveResult<ResolvedUnit> {
        self.ambient.resolve(name, true)
    }

    fn find_initialized(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        self.ambient.resolve(name, initialize)
    }

    fn find_in(
        &self,
        name: &str,
        initialize: bool,
        context: &NamespaceHandle,
    ) -> ResolveResult<ResolvedUnit> {
        context.resolve(name, initialize)
    }
}

/// Holder of the active [`UnitFinder`]; replaceable at any time.
pub struct ResolutionIndirection {
    strategy: RwLock<Arc<dyn UnitFinder>>,
}

impl ResolutionIndirection {
    pub fn new(default: Arc<dyn UnitFinder>) -> Self {
        Self {
            strategy: RwLock::new(default),
        }
    }

    /// Replaces the active strategy for every later lookup.
    pub fn install(&self, finder: Arc<dyn UnitFinder>) {
        *self.strategy.write().unwrap_or_else(PoisonError::into_inner) = finder;
    }

    pub fn strategy(&self) -> Arc<dyn UnitFinder> {
        Arc::clone(&self.strategy.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn find(&self, name: &str) -> ResolveResult<ResolvedUnit> {
        validate_name(name)?;
        self.strategy().find(name)
    }

    pub fn find_initialized(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        validate_name(name)?;
        self.strategy().find_initialized(name, initialize)
    }

    pub fn find_in(
        &self,
        name: &str,
        initialize: bool,
        context: &NamespaceHandle,
    ) -> ResolveResult<ResolvedUnit> {
        validate_name(name)?;
        self.strategy().find_in(name, initialize, context)
    }
}

fn validate_name(name: &str) -> ResolveResult<()> {
    if SYMBOL_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ResolveError::InvalidName(name.to_string()))
    }
}

/// Resolution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    InvalidName(String),
    NotFound { name: String, namespace: String },
    Host(String),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "symbolic name is invalid: `{value}`"),
            Self::NotFound { name, namespace } => {
                write!(f, "`{name}` not found in namespace `{namespace}`")
            }
            Self::Host(message) => write!(f, "host resolution failed: {message}"),
        }
    }
}

impl Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::{validate_name, ResolveError};

    #[test]
    fn accepts_dotted_identifiers() {
        for name in ["Entry", "app.core.Entry", "app.Outer$Inner", "_x.y1"] {
            validate_name(name).expect("valid symbolic name");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "app..Entry", ".Entry", "app.", "1app", "app/Entry", "a b"] {
            assert_eq!(
                validate_name(name),
                Err(ResolveError::InvalidName(name.to_string()))
            );
        }
    }
}
