//! Injectable code locations.

use super::{InjectorError, InjectorResult};
use std::path::{Path, PathBuf};

/// Absolute location of injectable code plus its routing flags.
///
/// Immutable once created. Adding the same path twice is legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionPath {
    location: PathBuf,
    isolated: bool,
    external: bool,
}

impl ExtensionPath {
    /// Builds a path routed to the host's primary container.
    ///
    /// # Errors
    /// - Returns [`InjectorError::InvalidPath`] for empty or relative locations.
    pub fn new(location: impl Into<PathBuf>) -> InjectorResult<Self> {
        let location = location.into();
        if location.as_os_str().is_empty() {
            return Err(InjectorError::InvalidPath {
                path: location,
                reason: "location must not be empty",
            });
        }
        if !location.is_absolute() {
            return Err(InjectorError::InvalidPath {
                path: location,
                reason: "location must be absolute",
            });
        }
        Ok(Self {
            location,
            isolated: false,
            external: false,
        })
    }

    /// Routes the path into the process-wide isolated namespace.
    pub fn isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    /// Marks third-party code, which observers keep out of the additions ledger.
    pub fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    pub fn is_external(&self) -> bool {
        self.external
    }
}
