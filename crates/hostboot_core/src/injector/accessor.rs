//! One-time privileged accessor acquisition.
//!
//! # Invariants
//! - The process-wide accessor is acquired at most once; the first outcome,
//!   success or failure, is kept for the process lifetime.
//! - Privileged host calls take the accessor as an explicit parameter.

use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

static PROCESS_ACCESSOR: OnceCell<Result<PrivilegedAccessor, AccessorError>> = OnceCell::new();

/// Host facility that can grant access to otherwise-restricted internals.
pub trait PrivilegeSource {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Unlocks privileged access, or explains why it is unavailable.
    fn unlock(&self) -> Result<(), String>;
}

/// Capability proving privileged access was granted.
///
/// Only [`PrivilegedAccessor::acquire`] creates one.
#[derive(Debug, Clone)]
pub struct PrivilegedAccessor {
    origin: String,
    acquired_at: Instant,
}

impl PrivilegedAccessor {
    /// Asks `source` for privileged access.
    ///
    /// # Errors
    /// - Returns [`AccessorError`] when the source refuses.
    pub fn acquire(source: &dyn PrivilegeSource) -> Result<Self, AccessorError> {
        match source.unlock() {
            Ok(()) => {
                info!(
                    "event=accessor_acquire module=injector status=ok source={}",
                    source.name()
                );
                Ok(Self {
                    origin: source.name().to_string(),
                    acquired_at: Instant::now(),
                })
            }
            Err(reason) => {
                error!(
                    "event=accessor_acquire module=injector status=error source={} error={}",
                    source.name(),
                    reason
                );
                Err(AccessorError {
                    source_name: source.name().to_string(),
                    reason,
                })
            }
        }
    }

    /// Name of the source that granted access.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }
}

/// Acquires the process-wide accessor on first call and returns the stored outcome afterwards.
pub fn acquire_process_accessor(
    source: &dyn PrivilegeSource,
) -> Result<PrivilegedAccessor, AccessorError> {
    PROCESS_ACCESSOR
        .get_or_init(|| PrivilegedAccessor::acquire(source))
        .clone()
}

/// Outcome of the process-wide acquisition, if it happened.
pub fn process_accessor() -> Option<&'static Result<PrivilegedAccessor, AccessorError>> {
    PROCESS_ACCESSOR.get()
}

/// Privileged access was refused at acquisition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorError {
    pub source_name: String,
    pub reason: String,
}

impl Display for AccessorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "privileged accessor unavailable (source: {}): {}",
            self.source_name, self.reason
        )
    }
}

impl Error for AccessorError {}

#[cfg(test)]
mod tests {
    use super::{acquire_process_accessor, PrivilegeSource, PrivilegedAccessor};

    struct StaticSource {
        granted: bool,
    }

    impl PrivilegeSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn unlock(&self) -> Result<(), String> {
            if self.granted {
                Ok(())
            } else {
                Err("lookup not found".to_string())
            }
        }
    }

    #[test]
    fn acquire_reports_source_refusal() {
        let err = PrivilegedAccessor::acquire(&StaticSource { granted: false })
            .expect_err("refused source must fail");
        assert_eq!(err.source_name, "static");
        assert!(err.to_string().contains("lookup not found"));
    }

    #[test]
    fn process_accessor_keeps_first_outcome() {
        let first = acquire_process_accessor(&StaticSource { granted: true })
            .expect("first acquisition succeeds");
        let second = acquire_process_accessor(&StaticSource { granted: false })
            .expect("later calls return the stored accessor");
        assert_eq!(first.origin(), second.origin());
        assert_eq!(first.acquired_at(), second.acquired_at());
    }
}
