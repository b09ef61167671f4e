//! Process-wide registry of awakened units.
//!
//! Modules publish the instance they created for a unit name so other modules
//! can look it up later in the lifecycle.

use log::debug;
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Instance stored for an awakened unit.
pub type AwakenedInstance = Arc<dyn Any + Send + Sync>;

static AWAKENED: Lazy<AwakenedRegistry> = Lazy::new(AwakenedRegistry::new);

/// Process-wide registry used by host adapters.
pub fn awakened() -> &'static AwakenedRegistry {
    &AWAKENED
}

/// Unit name to instance map, safe for concurrent use.
#[derive(Default)]
pub struct AwakenedRegistry {
    units: RwLock<HashMap<String, AwakenedInstance>>,
}

impl AwakenedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `instance` under `name` and returns the instance it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        instance: AwakenedInstance,
    ) -> Option<AwakenedInstance> {
        let name = name.into();
        debug!("event=awakened_register module=lifecycle status=ok unit={name}");
        self.units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, instance)
    }

    pub fn get(&self, name: &str) -> Option<AwakenedInstance> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Instance under `name` when it has concrete type `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)?.downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered unit names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
