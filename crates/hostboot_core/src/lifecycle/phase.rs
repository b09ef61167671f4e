//! Lifecycle phase ordering.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One step of the host-driven lifecycle, compared by declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Nothing has happened yet.
    #[default]
    None,
    /// Extension code was injected and is resolvable.
    Const,
    /// Host adapter object constructed.
    Init,
    /// Host load callback.
    Load,
    /// Host enable callback.
    Enable,
    /// First scheduling tick after enable.
    Active,
    /// Host shutdown callback.
    Disable,
}

impl LifecyclePhase {
    /// All phases in ascending order.
    pub const ALL: [LifecyclePhase; 7] = [
        Self::None,
        Self::Const,
        Self::Init,
        Self::Load,
        Self::Enable,
        Self::Active,
        Self::Disable,
    ];

    /// Ordinal position within [`LifecyclePhase::ALL`].
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_ordinal(value: u8) -> Self {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .unwrap_or(Self::Disable)
    }

    /// Stable lowercase name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Const => "const",
            Self::Init => "init",
            Self::Load => "load",
            Self::Enable => "enable",
            Self::Active => "active",
            Self::Disable => "disable",
        }
    }
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
