#![allow(dead_code)]

use hostboot_core::{
    ContainerType, HostContainer, HostRejection, PathSink, PrivilegeSource, PrivilegedAccessor,
    ResolveError, ResolveResult, ResolvedUnit,
};
use hostboot_core::injector::PATH_FIELD;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct Grant(pub bool);

impl PrivilegeSource for Grant {
    fn name(&self) -> &str {
        "test-grant"
    }

    fn unlock(&self) -> Result<(), String> {
        if self.0 {
            Ok(())
        } else {
            Err("lookup not found".to_string())
        }
    }
}

pub fn granted() -> PrivilegedAccessor {
    PrivilegedAccessor::acquire(&Grant(true)).expect("test grant always unlocks")
}

/// Path sink recording every extension, optionally refusing all of them.
pub struct SearchPath {
    type_name: &'static str,
    refuse: bool,
    paths: Mutex<Vec<PathBuf>>,
}

impl SearchPath {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            refuse: false,
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing(type_name: &'static str) -> Self {
        Self {
            refuse: true,
            ..Self::new(type_name)
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().expect("search path lock").clone()
    }
}

impl PathSink for SearchPath {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn extend(&self, _access: &PrivilegedAccessor, path: &Path) -> Result<(), HostRejection> {
        if self.refuse {
            return Err(HostRejection::new("no extend method on this revision"));
        }
        self.paths
            .lock()
            .expect("search path lock")
            .push(path.to_path_buf());
        Ok(())
    }
}

/// In-memory host container; the shape follows from how it is built.
pub struct FakeHost {
    ty: ContainerType,
    field_owner: Option<String>,
    hybrid: bool,
    pub search_path: SearchPath,
    known: BTreeSet<String>,
}

impl FakeHost {
    /// Own type declares the path field.
    pub fn conventional() -> Self {
        let ty = ContainerType::extending("host.AppContainer", ContainerType::root("core.Object"))
            .with_field(PATH_FIELD);
        Self {
            field_owner: Some("host.AppContainer".to_string()),
            ty,
            hybrid: false,
            search_path: SearchPath::new("host.UrlSearchPath"),
            known: BTreeSet::new(),
        }
    }

    /// Exposes a direct extend method and no field.
    pub fn hybrid() -> Self {
        Self {
            ty: ContainerType::extending("launch.LaunchContainer", ContainerType::root("core.Object")),
            field_owner: None,
            hybrid: true,
            search_path: SearchPath::new("launch.LaunchContainer"),
            known: BTreeSet::new(),
        }
    }

    /// Field declared two levels up the hierarchy.
    pub fn generic() -> Self {
        let base = ContainerType::extending("core.UrlContainer", ContainerType::root("core.Object"))
            .with_field(PATH_FIELD);
        let middle = ContainerType::extending("host.LibraryContainer", base);
        Self {
            ty: ContainerType::extending("host.PluginContainer", middle),
            field_owner: Some("core.UrlContainer".to_string()),
            hybrid: false,
            search_path: SearchPath::new("core.UrlSearchPath"),
            known: BTreeSet::new(),
        }
    }

    /// No type in the hierarchy declares the path field.
    pub fn bare() -> Self {
        Self {
            ty: ContainerType::extending("host.SealedContainer", ContainerType::root("core.Object")),
            field_owner: None,
            hybrid: false,
            search_path: SearchPath::new("none"),
            known: BTreeSet::new(),
        }
    }

    pub fn with_search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn knowing(mut self, name: &str) -> Self {
        self.known.insert(name.to_string());
        self
    }
}

impl HostContainer for FakeHost {
    fn container_type(&self) -> &ContainerType {
        &self.ty
    }

    fn extend_method(&self) -> Option<&dyn PathSink> {
        self.hybrid.then_some(&self.search_path as &dyn PathSink)
    }

    fn field(&self, declaring_type: &str, field: &str) -> Option<&dyn PathSink> {
        let owns = self.field_owner.as_deref() == Some(declaring_type) && field == PATH_FIELD;
        owns.then_some(&self.search_path as &dyn PathSink)
    }

    fn resolve(&self, name: &str, initialize: bool) -> ResolveResult<ResolvedUnit> {
        if self.known.contains(name) {
            Ok(ResolvedUnit {
                name: name.to_string(),
                origin: None,
                initialized: initialize,
            })
        } else {
            Err(ResolveError::NotFound {
                name: name.to_string(),
                namespace: self.ty.name.clone(),
            })
        }
    }
}
