//! Lifecycle orchestration.
//!
//! # Responsibility
//! - Define the ordered lifecycle phases host adapters drive.
//! - Defer module work to a phase, or run it inline when the phase has passed.
//! - Keep the process-wide registry of awakened unit instances.
//!
//! # Invariants
//! - The current phase never decreases.
//! - Once stopped, no task runs again.

mod awakened;
mod orchestrator;
mod phase;

pub use awakened::{awakened, AwakenedInstance, AwakenedRegistry};
pub use orchestrator::{
    execution, global, AdvanceOutcome, FailurePolicy, LifecycleError, LifecycleOrchestrator,
    PhaseReport, Registration, TaskError, TaskResult,
};
pub use phase::LifecyclePhase;
