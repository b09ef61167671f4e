//! Handles to the resolution scopes code can be injected into.

use super::host::HostContainer;
use super::isolated::{IsolatedNamespace, ISOLATED_NAMESPACE_NAME};
use crate::resolution::{ResolveResult, ResolvedUnit};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

#[derive(Clone)]
enum Scope {
    Primary(Arc<dyn HostContainer>),
    Isolated(Arc<IsolatedNamespace>),
}

/// Cheap, cloneable reference to either the host's primary container or the isolated namespace.
#[derive(Clone)]
pub struct NamespaceHandle {
    scope: Scope,
}

impl NamespaceHandle {
    pub fn primary(container: Arc<dyn HostContainer>) -> Self {
        Self {
            scope: Scope::Primary(container),
        }
    }

    pub fn isolated(namespace: Arc<IsolatedNamespace>) -> Self {
        Self {
            scope: Scope::Isolated(namespace),
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self.scope, Scope::Isolated(_))
    }

    /// Container type name for the primary scope, `isolated` otherwise.
    pub fn name(&self) -> &str {
        match &self.scope {
            Scope::Primary(container) => &container.container_type().name,
            Scope::Isolated(_) => ISOLATED_NAMESPACE_NAME,
        }
    }

    /// The isolated namespace behind this handle, if any.
    pub fn as_isolated(&self) -> Option<&Arc<IsolatedNamespace>> {
        match &self.scope {
            Scope::Isolated(namespace) => Some(namespace),
            Scope::Primary(_) => None,
        }
    }

    pub fn resolve(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        match &self.scope {
            Scope::Primary(container) => container.resolve(name, initialize),
            Scope::Isolated(namespace) => namespace.resolve(name, initialize),
        }
    }

    /// Whether both handles point at the same scope instance.
    pub fn same_scope(&self, other: &NamespaceHandle) -> bool {
        match (&self.scope, &other.scope) {
            (Scope::Primary(left), Scope::Primary(right)) => {
                std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
            }
            (Scope::Isolated(left), Scope::Isolated(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Debug for NamespaceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceHandle")
            .field("name", &self.name())
            .field("isolated", &self.is_isolated())
            .finish()
    }
}
