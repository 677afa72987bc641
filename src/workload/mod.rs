//! Workload generators: a two-phase `init` / `generate` lifecycle over an
//! identity pool and a program adapter.
mod contract;
mod funding;
mod transfer;


use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HarnessConfig;
use crate::error::WorkloadError;
use crate::ledger::{Connector, Receipt};
use crate::registry::Registries;

pub use contract::{ContractWorkload, DEFAULT_SPLIT, DEFAULT_WAIT_DEPLOY, contract};
pub use transfer::{TRANSFER_AMOUNT, TransferWorkload, transfer};

pub const AMOUNT: &str = "amount";
pub const WAIT_DEPLOY: &str = "wait_deploy";
pub const SPLIT: &str = "split";

#[async_trait]
pub trait WorkloadGenerator: Send + Sync {
    /// Registry key this generator was built from.
    fn kind(&self) -> &'static str;

    /// Number of worker slots; `generate` accepts ids in `0..concurrency()`.
    fn concurrency(&self) -> usize;

    /// Runs the setup sequence once, before the generator is shared.
    ///
    /// # Errors
    ///
    /// Returns the first setup step that failed. Already-provisioned
    /// resources are logged and skipped.
    async fn init(&mut self) -> Result<(), WorkloadError>;

    /// Issues one request on behalf of `worker_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadError::WorkerOutOfRange`] for ids outside the pool,
    /// [`WorkloadError::NotInitialized`] before `init` succeeded, and
    /// [`WorkloadError::Call`] when the ledger rejects the request.
    async fn generate(&self, worker_id: usize) -> Result<Arc<Receipt>, WorkloadError>;
}

/// What a workload factory may use while building its generator.
#[derive(Clone, Copy)]
pub struct BuildContext<'ctx> {
    pub registries: &'ctx Registries,
    pub connector: &'ctx dyn Connector,
}

pub type WorkloadFactory =
    fn(&HarnessConfig, &BuildContext<'_>) -> Result<Box<dyn WorkloadGenerator>, WorkloadError>;
