//! Capability registries mapping string keys to factories.
//!
//! Registration takes `&mut self` and happens at start-up, before the
//! [`Registries`] value is shared; lookups only need `&self`.
mod builtins;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HarnessConfig;
use crate::error::WorkloadError;
use crate::ledger::{Connector, LedgerClient};
use crate::program::{ProgramAdapter, ProgramConfig};
use crate::workload::{BuildContext, WorkloadFactory, WorkloadGenerator};

pub type ProgramFactory = fn(
    &ProgramConfig,
    Arc<dyn LedgerClient>,
) -> Result<Arc<dyn ProgramAdapter>, WorkloadError>;

/// Key to factory mapping. The last registration for a key wins.
#[derive(Clone)]
pub struct Registry<F> {
    label: &'static str,
    entries: BTreeMap<String, F>,
}

impl<F: Copy> Registry<F> {
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, key: &str, factory: F) {
        if self.entries.insert(key.to_owned(), factory).is_some() {
            tracing::debug!("Replacing registered {} factory: {}", self.label, key);
        }
    }

    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<F> {
        self.entries.get(key).copied()
    }

    /// Registered keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn keys_csv(&self) -> String {
        self.keys().join(", ")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The workload-kind and program-kind registries, built once at start.
#[derive(Clone)]
pub struct Registries {
    workloads: Registry<WorkloadFactory>,
    programs: Registry<ProgramFactory>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registries {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            workloads: Registry::new("workload"),
            programs: Registry::new("contract"),
        }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registries = Self::empty();
        builtins::register_builtins(&mut registries);
        registries
    }

    pub fn register_workload(&mut self, kind: &str, factory: WorkloadFactory) {
        self.workloads.register(kind, factory);
    }

    pub fn register_program(&mut self, name: &str, factory: ProgramFactory) {
        self.programs.register(name, factory);
    }

    #[must_use]
    pub const fn workloads(&self) -> &Registry<WorkloadFactory> {
        &self.workloads
    }

    #[must_use]
    pub const fn programs(&self) -> &Registry<ProgramFactory> {
        &self.programs
    }

    /// # Errors
    ///
    /// Returns [`WorkloadError::UnknownWorkload`] listing the registered kinds.
    pub fn workload_factory(&self, kind: &str) -> Result<WorkloadFactory, WorkloadError> {
        self.workloads
            .resolve(kind)
            .ok_or_else(|| WorkloadError::UnknownWorkload {
                kind: kind.to_owned(),
                available: self.workloads.keys_csv(),
            })
    }

    /// # Errors
    ///
    /// Returns [`WorkloadError::UnknownProgram`] listing the registered names.
    pub fn program_factory(&self, name: &str) -> Result<ProgramFactory, WorkloadError> {
        self.programs
            .resolve(name)
            .ok_or_else(|| WorkloadError::UnknownProgram {
                name: name.to_owned(),
                available: self.programs.keys_csv(),
            })
    }

    /// Resolves the configured workload kind and builds its generator.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadError::UnknownWorkload`] for an unregistered kind, or
    /// whatever the factory reports.
    pub fn build_workload(
        &self,
        config: &HarnessConfig,
        connector: &dyn Connector,
    ) -> Result<Box<dyn WorkloadGenerator>, WorkloadError> {
        let factory = self.workload_factory(&config.workload)?;
        let ctx = BuildContext {
            registries: self,
            connector,
        };
        factory(config, &ctx)
    }
}
