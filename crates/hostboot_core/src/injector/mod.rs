//! Runtime module injection.
//!
//! # Responsibility
//! - Make extension code resolvable by extending the host's primary container
//!   or the process-wide isolated namespace.
//! - Probe the host container shape at runtime and extend it through the
//!   privileged accessor.
//! - Notify observers after every successful injection.
//!
//! # Invariants
//! - Injection failures are fatal to bootstrap; there is no silent fallback.
//! - Observers run synchronously, in registration order, before `add_path` returns.
//! - Injector calls are serialized by the bootstrap thread.

mod accessor;
mod host;
mod isolated;
mod namespace;
mod observer;
mod path;
mod shape;

pub use accessor::{
    acquire_process_accessor, process_accessor, AccessorError, PrivilegeSource,
    PrivilegedAccessor,
};
pub use host::{ContainerType, HostContainer, HostRejection, PathSink, PATH_FIELD};
pub use isolated::{IsolatedNamespace, ISOLATED_NAMESPACE_NAME, UNIT_EXTENSION};
pub use namespace::NamespaceHandle;
pub use observer::{AdditionsLedger, InjectionObserver, LedgerEntry};
pub use path::ExtensionPath;
pub use shape::HostShape;

use crate::logging::sanitize_message;
use crate::resolution::{DirectFinder, ResolutionIndirection};
use crate::settings::BootstrapSettings;
use log::{error, info};
use once_cell::sync::OnceCell;
use shape::FieldLocator;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub type InjectorResult<T> = Result<T, InjectorError>;

// Rejection reasons are host-provided text.
const MAX_LOGGED_ERROR_CHARS: usize = 240;

static GLOBAL: OnceCell<ModuleInjector> = OnceCell::new();

/// Installs the process-wide injector used by host adapters.
///
/// # Errors
/// - Returns [`InjectorError::AlreadyInstalled`] on a second install.
pub fn install_global(injector: ModuleInjector) -> InjectorResult<&'static ModuleInjector> {
    GLOBAL
        .try_insert(injector)
        .map_err(|_| InjectorError::AlreadyInstalled)
}

/// Process-wide injector, once installed.
pub fn global() -> Option<&'static ModuleInjector> {
    GLOBAL.get()
}

/// Extends the host's code-resolution path and tracks injection observers.
pub struct ModuleInjector {
    primary: Arc<dyn HostContainer>,
    isolated: Arc<IsolatedNamespace>,
    accessor: Result<PrivilegedAccessor, AccessorError>,
    isolated_mode: bool,
    locator: FieldLocator,
    observers: RwLock<Vec<Arc<dyn InjectionObserver>>>,
    indirection: ResolutionIndirection,
}

impl ModuleInjector {
    /// Builds an injector over `primary`.
    ///
    /// `accessor` is the outcome of the one-time acquisition; when it failed,
    /// every primary-container injection fails fast.
    pub fn new(
        primary: Arc<dyn HostContainer>,
        accessor: Result<PrivilegedAccessor, AccessorError>,
        settings: &BootstrapSettings,
    ) -> Self {
        let isolated = Arc::new(IsolatedNamespace::new());
        let ambient = if settings.isolated_mode {
            NamespaceHandle::isolated(Arc::clone(&isolated))
        } else {
            NamespaceHandle::primary(Arc::clone(&primary))
        };
        Self {
            primary,
            isolated,
            accessor,
            isolated_mode: settings.isolated_mode,
            locator: FieldLocator::default(),
            observers: RwLock::new(Vec::new()),
            indirection: ResolutionIndirection::new(Arc::new(DirectFinder::new(ambient))),
        }
    }

    /// Makes the code at `path` resolvable and returns the namespace it went into.
    ///
    /// # Errors
    /// - [`InjectorError::AccessorUnavailable`] when privileged access was never granted.
    /// - [`InjectorError::FieldNotFound`] when no type in the container's
    ///   hierarchy declares the path field.
    /// - [`InjectorError::Rejected`] when the host refuses the extend call.
    pub fn add_path(&self, path: &ExtensionPath) -> InjectorResult<NamespaceHandle> {
        let location = path.location();
        let handle = if path.is_isolated() {
            self.isolated.add_path(location);
            info!(
                "event=injector_add_path module=injector status=ok namespace={} path={} external={}",
                ISOLATED_NAMESPACE_NAME,
                location.display(),
                path.is_external()
            );
            NamespaceHandle::isolated(Arc::clone(&self.isolated))
        } else {
            let container = self.primary.as_ref();
            let shape = HostShape::probe(container);
            let outcome = self
                .accessor()
                .and_then(|access| shape.extend(container, &self.locator, access, location));
            if let Err(err) = outcome {
                error!(
                    "event=injector_add_path module=injector status=error container={} shape={} path={} error={}",
                    container.container_type().name,
                    shape,
                    location.display(),
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                return Err(err);
            }
            info!(
                "event=injector_add_path module=injector status=ok container={} shape={} path={} external={}",
                container.container_type().name,
                shape,
                location.display(),
                path.is_external()
            );
            NamespaceHandle::primary(Arc::clone(&self.primary))
        };

        self.notify(&handle, path);
        Ok(handle)
    }

    /// Whether `name` resolves in the resolution context, without initializing it.
    ///
    /// Never fails; any resolution error reads as `false`.
    pub fn is_exists(&self, name: &str) -> bool {
        self.indirection
            .find_in(name, false, &self.resolution_context())
            .is_ok()
    }

    /// Appends an observer. There is no removal.
    pub fn register_callback(&self, observer: Arc<dyn InjectionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Isolated namespace in isolated mode, the host's primary container otherwise.
    pub fn resolution_context(&self) -> NamespaceHandle {
        if self.isolated_mode {
            NamespaceHandle::isolated(Arc::clone(&self.isolated))
        } else {
            NamespaceHandle::primary(Arc::clone(&self.primary))
        }
    }

    /// Swappable resolution strategy all internal lookups go through.
    pub fn indirection(&self) -> &ResolutionIndirection {
        &self.indirection
    }

    /// Shape the primary container currently probes as.
    pub fn host_shape(&self) -> HostShape {
        HostShape::probe(self.primary.as_ref())
    }

    pub fn isolated_namespace(&self) -> &Arc<IsolatedNamespace> {
        &self.isolated
    }

    fn accessor(&self) -> InjectorResult<&PrivilegedAccessor> {
        self.accessor
            .as_ref()
            .map_err(|err| InjectorError::AccessorUnavailable(err.clone()))
    }

    fn notify(&self, handle: &NamespaceHandle, path: &ExtensionPath) {
        // Snapshot so observers may register further observers.
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_injected(handle, path.location(), path.is_external());
        }
    }
}

/// Fatal injection failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectorError {
    InvalidPath {
        path: PathBuf,
        reason: &'static str,
    },
    AccessorUnavailable(AccessorError),
    FieldNotFound {
        container_type: String,
        shape: HostShape,
    },
    Rejected {
        container_type: String,
        shape: HostShape,
        sink_type: String,
        reason: String,
    },
    AlreadyInstalled,
}

impl Display for InjectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath { path, reason } => {
                write!(f, "invalid extension path `{}`: {reason}", path.display())
            }
            Self::AccessorUnavailable(err) => write!(f, "{err}"),
            Self::FieldNotFound {
                container_type,
                shape,
            } => write!(
                f,
                "`{PATH_FIELD}` field not found (container: {container_type}, shape: {shape})"
            ),
            Self::Rejected {
                container_type,
                shape,
                sink_type,
                reason,
            } => write!(
                f,
                "unsupported host (container: {container_type}, shape: {shape}, path sink: {sink_type}): {reason}"
            ),
            Self::AlreadyInstalled => write!(f, "process-wide injector already installed"),
        }
    }
}

impl Error for InjectorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AccessorUnavailable(err) => Some(err),
            _ => None,
        }
    }
}
