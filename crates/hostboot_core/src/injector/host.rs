//! Host container contracts consumed by the injector.
//!
//! Host adapters implement these traits over the host's real code-resolution
//! machinery; the injector only probes and extends through them.

use super::accessor::PrivilegedAccessor;
use crate::resolution::{ResolveResult, ResolvedUnit};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Name of the extensible path field looked up on host container types.
pub const PATH_FIELD: &str = "search_path";

/// Type metadata of a host container, including its ancestry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerType {
    pub name: String,
    pub declared_fields: Vec<String>,
    /// `None` marks the root type.
    pub parent: Option<Box<ContainerType>>,
}

impl ContainerType {
    /// Root type with no declared fields.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_fields: Vec::new(),
            parent: None,
        }
    }

    pub fn extending(name: impl Into<String>, parent: ContainerType) -> Self {
        Self {
            name: name.into(),
            declared_fields: Vec::new(),
            parent: Some(Box::new(parent)),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.declared_fields.push(field.into());
        self
    }

    pub fn declares(&self, field: &str) -> bool {
        self.declared_fields.iter().any(|declared| declared == field)
    }

    /// Last segment of the type name.
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(['.', ':'])
            .next()
            .unwrap_or(self.name.as_str())
    }

    /// Walks from this type towards the root and returns the first type declaring `field`.
    pub fn find_declaring(&self, field: &str) -> Option<&ContainerType> {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.declares(field) {
                return Some(ty);
            }
            current = ty.parent.as_deref();
        }
        None
    }
}

/// Something that accepts additional code locations.
pub trait PathSink: Send + Sync {
    /// Runtime type name of the sink, reported in failure messages.
    fn type_name(&self) -> &str;

    /// Appends `path` to the sink's search path.
    fn extend(&self, access: &PrivilegedAccessor, path: &Path) -> Result<(), HostRejection>;
}

/// The host's primary code-resolution container.
pub trait HostContainer: Send + Sync {
    fn container_type(&self) -> &ContainerType;

    /// Directly invocable extend method; only hybrid hosts expose one.
    fn extend_method(&self) -> Option<&dyn PathSink> {
        None
    }

    /// Value of `field` as declared on the type named `declaring_type`.
    fn field(&self, declaring_type: &str, field: &str) -> Option<&dyn PathSink>;

    /// Resolves `name`, optionally running its initializer.
    fn resolve(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit>;
}

/// The host refused an extend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRejection {
    pub reason: String,
}

impl HostRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for HostRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

impl Error for HostRejection {}
