//! Host container shape probing and the per-shape extend strategies.

use super::accessor::PrivilegedAccessor;
use super::host::{HostContainer, PathSink, PATH_FIELD};
use super::{InjectorError, InjectorResult};
use log::debug;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Known shapes of a host's primary container.
///
/// New host shapes get a new variant rather than more branching in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostShape {
    /// The container's own type declares the extensible path field.
    Conventional,
    /// The container exposes a directly invocable extend method.
    Hybrid,
    /// The path field must be found by walking the type hierarchy.
    Generic,
}

impl HostShape {
    /// Selects the shape from the capabilities `container` exposes.
    pub fn probe(container: &dyn HostContainer) -> Self {
        if container.extend_method().is_some() {
            Self::Hybrid
        } else if container.container_type().declares(PATH_FIELD) {
            Self::Conventional
        } else {
            Self::Generic
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::Hybrid => "hybrid",
            Self::Generic => "generic",
        }
    }

    /// Extends `container` with `path` the way this shape requires.
    pub(crate) fn extend(
        self,
        container: &dyn HostContainer,
        locator: &FieldLocator,
        access: &PrivilegedAccessor,
        path: &Path,
    ) -> InjectorResult<()> {
        let sink = match self {
            Self::Hybrid => container
                .extend_method()
                .ok_or_else(|| self.field_not_found(container))?,
            Self::Conventional | Self::Generic => {
                let declaring = locator
                    .locate(container)
                    .ok_or_else(|| self.field_not_found(container))?;
                container
                    .field(&declaring, PATH_FIELD)
                    .ok_or_else(|| self.field_not_found(container))?
            }
        };
        self.invoke(container, sink, access, path)
    }

    fn invoke(
        self,
        container: &dyn HostContainer,
        sink: &dyn PathSink,
        access: &PrivilegedAccessor,
        path: &Path,
    ) -> InjectorResult<()> {
        sink.extend(access, path)
            .map_err(|rejection| InjectorError::Rejected {
                container_type: container.container_type().name.clone(),
                shape: self,
                sink_type: sink.type_name().to_string(),
                reason: rejection.reason,
            })
    }

    fn field_not_found(self, container: &dyn HostContainer) -> InjectorError {
        InjectorError::FieldNotFound {
            container_type: container.container_type().name.clone(),
            shape: self,
        }
    }
}

impl Display for HostShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caches, per container type, which type in its ancestry declares the path field.
#[derive(Debug, Default)]
pub(crate) struct FieldLocator {
    cache: Mutex<HashMap<String, String>>,
}

impl FieldLocator {
    pub(crate) fn locate(&self, container: &dyn HostContainer) -> Option<String> {
        let ty = container.container_type();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(declaring) = cache.get(&ty.name) {
            return Some(declaring.clone());
        }
        let declaring = ty.find_declaring(PATH_FIELD)?.name.clone();
        debug!(
            "event=injector_locate module=injector status=ok container={} declaring={}",
            ty.name, declaring
        );
        cache.insert(ty.name.clone(), declaring.clone());
        Some(declaring)
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
