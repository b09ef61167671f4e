//! Host-adapter call sequence over the injector and the orchestrator.
//!
//! # Responsibility
//! - Inject extension paths once at attach time, then advance `CONST`.
//! - Advance the remaining phases in the fixed adapter order.
//! - Stop the orchestrator when bootstrap cannot continue.
//!
//! # Invariants
//! - A failed attach leaves the orchestrator stopped; later steps run nothing.
//! - Every step re-checks that the required runtime symbols still resolve.

use crate::injector::{ExtensionPath, InjectorError, ModuleInjector};
use crate::lifecycle::{AdvanceOutcome, LifecycleError, LifecycleOrchestrator, LifecyclePhase};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Drives one host adapter through attach, construct, load, enable, activate, disable.
pub struct BootstrapDriver<'a> {
    injector: &'a ModuleInjector,
    orchestrator: &'a LifecycleOrchestrator,
    required_symbols: Vec<String>,
}

impl<'a> BootstrapDriver<'a> {
    pub fn new(injector: &'a ModuleInjector, orchestrator: &'a LifecycleOrchestrator) -> Self {
        Self {
            injector,
            orchestrator,
            required_symbols: Vec::new(),
        }
    }

    /// Symbols that must resolve before any phase runs, e.g. a language runtime entry point.
    pub fn require_symbol(mut self, name: impl Into<String>) -> Self {
        self.required_symbols.push(name.into());
        self
    }

    /// Injects `paths` in order and advances `CONST`.
    ///
    /// # Errors
    /// - [`BootstrapError::Injection`] for the first failing path; the
    ///   orchestrator is stopped and no further path is injected.
    /// - [`BootstrapError::MissingRuntime`] when a required symbol does not resolve.
    /// - [`BootstrapError::Lifecycle`] when a `CONST` task fails.
    pub fn attach(&self, paths: &[ExtensionPath]) -> BootstrapResult<AdvanceOutcome> {
        if self.orchestrator.is_stopped() {
            return Ok(AdvanceOutcome::Skipped);
        }
        for path in paths {
            if let Err(err) = self.injector.add_path(path) {
                self.orchestrator.stop();
                error!(
                    "event=bootstrap_attach module=bootstrap status=error path={} error={}",
                    path.location().display(),
                    err
                );
                return Err(BootstrapError::Injection(err));
            }
        }
        info!(
            "event=bootstrap_attach module=bootstrap status=ok paths={}",
            paths.len()
        );
        self.step(LifecyclePhase::Const)
    }

    /// Adapter object constructed.
    pub fn construct(&self) -> BootstrapResult<AdvanceOutcome> {
        self.step(LifecyclePhase::Init)
    }

    pub fn load(&self) -> BootstrapResult<AdvanceOutcome> {
        self.step(LifecyclePhase::Load)
    }

    /// Advances `ENABLE`; returns whether the host should schedule [`Self::activate`]
    /// on its next tick.
    pub fn enable(&self) -> BootstrapResult<bool> {
        self.step(LifecyclePhase::Enable)?;
        Ok(!self.orchestrator.is_stopped())
    }

    pub fn activate(&self) -> BootstrapResult<AdvanceOutcome> {
        self.step(LifecyclePhase::Active)
    }

    pub fn disable(&self) -> BootstrapResult<AdvanceOutcome> {
        self.step(LifecyclePhase::Disable)
    }

    fn step(&self, phase: LifecyclePhase) -> BootstrapResult<AdvanceOutcome> {
        if self.orchestrator.is_stopped() {
            return Ok(AdvanceOutcome::Skipped);
        }
        self.ensure_runtime()?;
        let outcome = self.orchestrator.advance(phase)?;
        info!(
            "event=bootstrap_step module=bootstrap status=ok phase={} executed={}",
            phase,
            outcome.executed()
        );
        Ok(outcome)
    }

    fn ensure_runtime(&self) -> BootstrapResult<()> {
        let missing = self
            .required_symbols
            .iter()
            .find(|name| !self.injector.is_exists(name));
        if let Some(name) = missing {
            self.orchestrator.stop();
            error!(
                "event=bootstrap_runtime module=bootstrap status=error missing={}",
                name
            );
            return Err(BootstrapError::MissingRuntime(name.clone()));
        }
        Ok(())
    }
}

/// Bootstrap failures surfaced to the host adapter.
#[derive(Debug)]
pub enum BootstrapError {
    Injection(InjectorError),
    MissingRuntime(String),
    Lifecycle(LifecycleError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injection(err) => write!(f, "extension injection failed: {err}"),
            Self::MissingRuntime(name) => {
                write!(f, "runtime environment setup failed: `{name}` not resolvable")
            }
            Self::Lifecycle(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Injection(err) => Some(err),
            Self::MissingRuntime(_) => None,
            Self::Lifecycle(err) => Some(err),
        }
    }
}

impl From<LifecycleError> for BootstrapError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}
