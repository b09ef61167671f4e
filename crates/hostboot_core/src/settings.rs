//! Process-wide bootstrap flags.
//!
//! # Responsibility
//! - Hold the debug-logging and isolated-namespace flags read once at startup.
//! - Load them from the environment or from a JSON document.
//!
//! # Invariants
//! - The process-wide value is write-once; later installs are rejected.

use log::LevelFilter;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Environment variable enabling debug logging.
pub const ENV_DEBUG_MODE: &str = "HOSTBOOT_DEBUG";
/// Environment variable enabling isolated-namespace mode.
pub const ENV_ISOLATED_MODE: &str = "HOSTBOOT_ISOLATED";

static SETTINGS: OnceCell<BootstrapSettings> = OnceCell::new();

/// Flags every host adapter reads once and propagates to the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BootstrapSettings {
    /// Emits debug-level diagnostics (phase timings, probe results).
    pub debug_mode: bool,
    /// Resolves extension code through the isolated namespace instead of the host container.
    pub isolated_mode: bool,
}

impl BootstrapSettings {
    /// Reads both flags from `HOSTBOOT_DEBUG` / `HOSTBOOT_ISOLATED`.
    ///
    /// Unset variables are `false`.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            debug_mode: read_env_flag(ENV_DEBUG_MODE)?,
            isolated_mode: read_env_flag(ENV_ISOLATED_MODE)?,
        })
    }

    /// Parses settings from a JSON object; missing keys default to `false`.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(raw).map_err(|err| SettingsError::InvalidDocument(err.to_string()))
    }

    /// Log level implied by the debug flag.
    pub fn log_level(&self) -> LevelFilter {
        if self.debug_mode {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

/// Installs the process-wide settings.
///
/// Re-installing the same value is accepted; a different value is rejected.
pub fn install(settings: BootstrapSettings) -> Result<&'static BootstrapSettings, SettingsError> {
    let active = SETTINGS.get_or_init(|| settings);
    if *active != settings {
        return Err(SettingsError::AlreadyInstalled(*active));
    }
    Ok(active)
}

/// Returns the installed settings, reading the environment on first access.
pub fn current() -> Result<&'static BootstrapSettings, SettingsError> {
    SETTINGS.get_or_try_init(BootstrapSettings::from_env)
}

fn read_env_flag(name: &'static str) -> Result<bool, SettingsError> {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value).ok_or(SettingsError::InvalidFlag {
            name,
            value: value.trim().to_string(),
        }),
        Err(std::env::VarError::NotPresent) => Ok(false),
        Err(std::env::VarError::NotUnicode(_)) => Err(SettingsError::InvalidFlag {
            name,
            value: "<non-unicode>".to_string(),
        }),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings load/install errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    InvalidFlag { name: &'static str, value: String },
    InvalidDocument(String),
    AlreadyInstalled(BootstrapSettings),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFlag { name, value } => {
                write!(f, "environment flag `{name}` has unsupported value `{value}`")
            }
            Self::InvalidDocument(message) => write!(f, "invalid settings document: {message}"),
            Self::AlreadyInstalled(active) => write!(
                f,
                "settings already installed (debug_mode={}, isolated_mode={})",
                active.debug_mode, active.isolated_mode
            ),
        }
    }
}

impl Error for SettingsError {}
