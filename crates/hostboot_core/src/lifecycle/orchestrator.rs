//! Deferred task registry and phase draining.
//!
//! # Responsibility
//! - Keep one pending task list per not-yet-reached phase.
//! - Drain a phase's list once, in ascending priority, when the phase is reached.
//!
//! # Invariants
//! - The phase check in `register_task` and the phase switch in `advance`
//!   happen under the same lock, so no task lands in an already-drained list.
//! - Tasks run on the calling thread, never while the pending lock is held.

use super::phase::LifecyclePhase;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Error type a task action may return.
pub type TaskError = Box<dyn Error + Send + Sync + 'static>;
/// Return type of a task action.
pub type TaskResult = Result<(), TaskError>;

type TaskAction = Box<dyn FnOnce() -> TaskResult + Send + 'static>;

static GLOBAL: Lazy<LifecycleOrchestrator> = Lazy::new(LifecycleOrchestrator::new);

/// Process-wide orchestrator used by host adapters.
///
/// Tests should construct their own [`LifecycleOrchestrator`] instead.
pub fn global() -> &'static LifecycleOrchestrator {
    &GLOBAL
}

/// Runs `task` and returns the elapsed wall time in milliseconds.
pub fn execution(task: impl FnOnce()) -> u128 {
    let started_at = Instant::now();
    task();
    started_at.elapsed().as_millis()
}

/// What happens to the orchestrator when a task action fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error; later phases still run.
    #[default]
    Propagate,
    /// Return the error and stop the orchestrator.
    StopOrchestrator,
}

/// Branch taken by [`LifecycleOrchestrator::register_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Queued until the phase is advanced to.
    Deferred,
    /// The phase had already been reached; the action ran before returning.
    RanInline,
    /// The orchestrator is stopped; the action was discarded without running.
    Discarded,
}

/// Summary of one phase drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: LifecyclePhase,
    pub executed: usize,
    pub elapsed: Duration,
}

/// Result of [`LifecycleOrchestrator::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Completed(PhaseReport),
    /// The orchestrator was stopped; nothing ran and the phase did not change.
    Skipped,
}

impl AdvanceOutcome {
    /// Number of tasks that ran during this call.
    pub fn executed(&self) -> usize {
        match self {
            Self::Completed(report) => report.executed,
            Self::Skipped => 0,
        }
    }
}

struct LifecycleTask {
    priority: i32,
    action: TaskAction,
}

/// Explicit orchestrator context: current phase, pending tasks, stop flag.
pub struct LifecycleOrchestrator {
    current: AtomicU8,
    stopped: AtomicBool,
    policy: FailurePolicy,
    pending: Mutex<HashMap<LifecyclePhase, Vec<LifecycleTask>>>,
}

impl Default for LifecycleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleOrchestrator {
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::default())
    }

    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self {
            current: AtomicU8::new(LifecyclePhase::None.ordinal()),
            stopped: AtomicBool::new(false),
            policy,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn current_phase(&self) -> LifecyclePhase {
        LifecyclePhase::from_ordinal(self.current.load(Ordering::Acquire))
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Stops the orchestrator for the rest of the process. One-way.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            warn!(
                "event=lifecycle_stop module=lifecycle status=stopped phase={}",
                self.current_phase()
            );
        }
    }

    /// Number of tasks waiting for `phase`.
    pub fn pending_count(&self, phase: LifecyclePhase) -> usize {
        self.lock_pending().get(&phase).map_or(0, Vec::len)
    }

    /// Defers `action` to `phase`, or runs it inline when `phase` was already reached.
    ///
    /// Lower `priority` runs first; ties keep registration order.
    ///
    /// # Errors
    /// - Returns [`LifecycleError::TaskFailed`] when an inline action fails.
    pub fn register_task<F>(
        &self,
        phase: LifecyclePhase,
        priority: i32,
        action: F,
    ) -> Result<Registration, LifecycleError>
    where
        F: FnOnce() -> TaskResult + Send + 'static,
    {
        {
            let mut pending = self.lock_pending();
            if self.is_stopped() {
                debug!(
                    "event=lifecycle_register module=lifecycle status=discarded phase={phase} priority={priority}"
                );
                return Ok(Registration::Discarded);
            }
            if phase > self.current_phase() {
                pending.entry(phase).or_default().push(LifecycleTask {
                    priority,
                    action: Box::new(action),
                });
                return Ok(Registration::Deferred);
            }
        }

        self.run_task(phase, priority, Box::new(action))?;
        Ok(Registration::RanInline)
    }

    /// Moves to `phase` and drains the tasks registered for exactly that phase.
    ///
    /// # Errors
    /// - Returns [`LifecycleError::TaskFailed`] for the first failing task;
    ///   the remaining tasks of this drain are dropped without running.
    pub fn advance(&self, phase: LifecyclePhase) -> Result<AdvanceOutcome, LifecycleError> {
        let started_at = Instant::now();
        let mut tasks = {
            let mut pending = self.lock_pending();
            if self.is_stopped() {
                return Ok(AdvanceOutcome::Skipped);
            }
            let previous = self.current_phase();
            if phase < previous {
                warn!(
                    "event=lifecycle_advance module=lifecycle status=regressed phase={phase} current={previous}"
                );
            } else {
                self.current.store(phase.ordinal(), Ordering::Release);
            }
            pending.remove(&phase).unwrap_or_default()
        };
        tasks.sort_by_key(|task| task.priority);

        let mut executed = 0;
        for task in tasks {
            if self.is_stopped() {
                info!(
                    "event=lifecycle_advance module=lifecycle status=interrupted phase={phase} executed={executed}"
                );
                break;
            }
            self.run_task(phase, task.priority, task.action)?;
            executed += 1;
        }

        let report = PhaseReport {
            phase,
            executed,
            elapsed: started_at.elapsed(),
        };
        debug!(
            "event=lifecycle_advance module=lifecycle status=ok phase={phase} executed={executed} duration_ms={}",
            report.elapsed.as_millis()
        );
        Ok(AdvanceOutcome::Completed(report))
    }

    fn run_task(
        &self,
        phase: LifecyclePhase,
        priority: i32,
        action: TaskAction,
    ) -> Result<(), LifecycleError> {
        action().map_err(|source| {
            error!(
                "event=lifecycle_task module=lifecycle status=error phase={phase} priority={priority} error={source}"
            );
            if self.policy == FailurePolicy::StopOrchestrator {
                self.stop();
            }
            LifecycleError::TaskFailed {
                phase,
                priority,
                source,
            }
        })
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<LifecyclePhase, Vec<LifecycleTask>>> {
        // Tasks never run under this lock, so a poisoned guard still holds a consistent map.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lifecycle task errors.
#[derive(Debug)]
pub enum LifecycleError {
    TaskFailed {
        phase: LifecyclePhase,
        priority: i32,
        source: TaskError,
    },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskFailed {
                phase,
                priority,
                source,
            } => write!(
                f,
                "lifecycle task failed (phase: {phase}, priority: {priority}): {source}"
            ),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TaskFailed { source, .. } => Some(source.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        execution, AdvanceOutcome, FailurePolicy, LifecycleError, LifecycleOrchestrator,
        Registration,
    };
    use crate::lifecycle::LifecyclePhase;
    use std::sync::{Arc, Mutex};

    fn recorder() -> Arc<Mutex<Vec<i32>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(log: &Arc<Mutex<Vec<i32>>>, value: i32) -> impl FnOnce() -> super::TaskResult {
        let log = Arc::clone(log);
        move || {
            log.lock().expect("recorder lock").push(value);
            Ok(())
        }
    }

    #[test]
    fn runs_deferred_tasks_in_ascending_priority() {
        let orchestrator = LifecycleOrchestrator::new();
        let log = recorder();
        for priority in [5, 1, 3] {
            let registration = orchestrator
                .register_task(LifecyclePhase::Load, priority, record(&log, priority))
                .expect("deferred registration");
            assert_eq!(registration, Registration::Deferred);
        }
        assert_eq!(orchestrator.pending_count(LifecyclePhase::Load), 3);

        let outcome = orchestrator
            .advance(LifecyclePhase::Load)
            .expect("drain should succeed");
        assert_eq!(outcome.executed(), 3);
        assert_eq!(*log.lock().expect("recorder lock"), vec![1, 3, 5]);
        assert_eq!(orchestrator.pending_count(LifecyclePhase::Load), 0);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let orchestrator = LifecycleOrchestrator::new();
        let log = recorder();
        for value in [10, 20, 30] {
            orchestrator
                .register_task(LifecyclePhase::Enable, 0, record(&log, value))
                .expect("deferred registration");
        }
        orchestrator
            .advance(LifecyclePhase::Enable)
            .expect("drain should succeed");
        assert_eq!(*log.lock().expect("recorder lock"), vec![10, 20, 30]);
    }

    #[test]
    fn registration_for_reached_phase_runs_inline() {
        let orchestrator = LifecycleOrchestrator::new();
        orchestrator
            .advance(LifecyclePhase::Init)
            .expect("advance to init");
        let log = recorder();

        let registration = orchestrator
            .register_task(LifecyclePhase::Const, 0, record(&log, 1))
            .expect("inline registration");
        assert_eq!(registration, Registration::RanInline);
        assert_eq!(*log.lock().expect("recorder lock"), vec![1]);
        assert_eq!(orchestrator.pending_count(LifecyclePhase::Const), 0);
    }

    #[test]
    fn second_advance_of_same_phase_runs_nothing() {
        let orchestrator = LifecycleOrchestrator::new();
        let log = recorder();
        orchestrator
            .register_task(LifecyclePhase::Load, 0, record(&log, 1))
            .expect("deferred registration");

        let first = orchestrator
            .advance(LifecyclePhase::Load)
            .expect("first drain");
        let second = orchestrator
            .advance(LifecyclePhase::Load)
            .expect("second drain");
        assert_eq!(first.executed(), 1);
        assert_eq!(second.executed(), 0);
    }

    #[test]
    fn stopped_orchestrator_skips_advance_and_keeps_phase() {
        let orchestrator = LifecycleOrchestrator::new();
        let log = recorder();
        orchestrator
            .register_task(LifecyclePhase::Load, 0, record(&log, 1))
            .expect("deferred registration");
        orchestrator
            .advance(LifecyclePhase::Const)
            .expect("advance to const");

        orchestrator.stop();
        let outcome = orchestrator
            .advance(LifecyclePhase::Load)
            .expect("stopped advance is not an error");
        assert_eq!(outcome, AdvanceOutcome::Skipped);
        assert_eq!(orchestrator.current_phase(), LifecyclePhase::Const);
        assert!(log.lock().expect("recorder lock").is_empty());

        let registration = orchestrator
            .register_task(LifecyclePhase::None, 0, record(&log, 2))
            .expect("stopped registration");
        assert_eq!(registration, Registration::Discarded);
        assert!(log.lock().expect("recorder lock").is_empty());
    }

    #[test]
    fn failing_task_aborts_remaining_drain_with_propagate_policy() {
        let orchestrator = LifecycleOrchestrator::new();
        let log = recorder();
        orchestrator
            .register_task(LifecyclePhase::Load, 1, record(&log, 1))
            .expect("deferred registration");
        orchestrator
            .register_task(LifecyclePhase::Load, 2, || Err("boom".into()))
            .expect("deferred registration");
        orchestrator
            .register_task(LifecyclePhase::Load, 3, record(&log, 3))
            .expect("deferred registration");

        let err = orchestrator
            .advance(LifecyclePhase::Load)
            .expect_err("failing task must propagate");
        assert!(matches!(
            err,
            LifecycleError::TaskFailed { priority: 2, .. }
        ));
        assert!(err.to_string().contains("boom"));
        assert_eq!(*log.lock().expect("recorder lock"), vec![1]);
        assert!(!orchestrator.is_stopped());
        assert_eq!(orchestrator.current_phase(), LifecyclePhase::Load);
    }

    #[test]
    fn stop_policy_stops_orchestrator_on_failure() {
        let orchestrator = LifecycleOrchestrator::with_policy(FailurePolicy::StopOrchestrator);
        orchestrator
            .register_task(LifecyclePhase::Enable, 0, || Err("enable failed".into()))
            .expect("deferred registration");

        orchestrator
            .advance(LifecyclePhase::Enable)
            .expect_err("failing task must propagate");
        assert!(orchestrator.is_stopped());
    }

    #[test]
    fn task_stopping_orchestrator_interrupts_its_drain() {
        let orchestrator = Arc::new(LifecycleOrchestrator::new());
        let log = recorder();
        let handle = Arc::clone(&orchestrator);
        orchestrator
            .register_task(LifecyclePhase::Enable, 0, move || {
                handle.stop();
                Ok(())
            })
            .expect("deferred registration");
        orchestrator
            .register_task(LifecyclePhase::Enable, 1, record(&log, 1))
            .expect("deferred registration");

        let outcome = orchestrator
            .advance(LifecyclePhase::Enable)
            .expect("drain should not fail");
        assert_eq!(outcome.executed(), 1);
        assert!(log.lock().expect("recorder lock").is_empty());
    }

    #[test]
    fn advancing_backwards_keeps_current_phase() {
        let orchestrator = LifecycleOrchestrator::new();
        orchestrator
            .advance(LifecyclePhase::Enable)
            .expect("advance to enable");
        orchestrator
            .advance(LifecyclePhase::Load)
            .expect("backwards advance");
        assert_eq!(orchestrator.current_phase(), LifecyclePhase::Enable);
    }

    #[test]
    fn execution_reports_elapsed_millis() {
        let elapsed = execution(|| std::thread::sleep(std::time::Duration::from_millis(5)));
        assert!(elapsed >= 5);
    }
}
