//! Bootstrap layer for injecting extension code into a running host.
//! The injector makes code resolvable; the orchestrator sequences its initialization.

pub mod bootstrap;
pub mod injector;
pub mod integrity;
pub mod lifecycle;
pub mod logging;
pub mod resolution;
pub mod settings;

pub use bootstrap::{BootstrapDriver, BootstrapError, BootstrapResult};
pub use injector::{
    AdditionsLedger, ContainerType, ExtensionPath, HostContainer, HostRejection, HostShape,
    InjectionObserver, InjectorError, InjectorResult, IsolatedNamespace, ModuleInjector,
    NamespaceHandle, PathSink, PrivilegeSource, PrivilegedAccessor,
};
pub use integrity::{HashDigest, IntegrityError};
pub use lifecycle::{
    AdvanceOutcome, AwakenedRegistry, FailurePolicy, LifecycleError, LifecycleOrchestrator,
    LifecyclePhase, Registration,
};
pub use logging::{init_logging, init_logging_for, logging_status, LoggingError};
pub use resolution::{
    DirectFinder, ResolutionIndirection, ResolveError, ResolveResult, ResolvedUnit, UnitFinder,
};
pub use settings::{BootstrapSettings, SettingsError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
