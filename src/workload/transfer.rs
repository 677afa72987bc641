use std::sync::Arc;

use async_trait::async_trait;

use crate::args::PositiveUsize;
use crate::config::HarnessConfig;
use crate::error::{SetupStep, WorkloadError};
use crate::identity::IdentityPool;
use crate::ledger::{LedgerClient, Receipt, RequestOptions};
use crate::program::optional_arg;

use super::funding::{fund_workers, parse_amount, parse_positive_amount};
use super::{AMOUNT, BuildContext, DEFAULT_SPLIT, SPLIT, WorkloadGenerator};

const KIND: &str = "transfer";
pub const TRANSFER_AMOUNT: &str = "transfer_amount";
const DEFAULT_TRANSFER_AMOUNT: u128 = 1;

/// Every worker repeatedly sends a fixed amount to the next worker slot.
pub struct TransferWorkload {
    amount: u128,
    transfer_amount: String,
    split: usize,
    identities: IdentityPool,
    client: Arc<dyn LedgerClient>,
    initialized: bool,
}

/// Workload factory for the `transfer` kind.
///
/// # Errors
///
/// See [`TransferWorkload::new`].
pub fn transfer(
    config: &HarnessConfig,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn WorkloadGenerator>, WorkloadError> {
    Ok(Box::new(TransferWorkload::new(config, ctx)?))
}

impl TransferWorkload {
    /// # Errors
    ///
    /// Returns a configuration error for malformed amounts, identities that
    /// cannot be loaded or an unreachable host.
    pub fn new(config: &HarnessConfig, ctx: &BuildContext<'_>) -> Result<Self, WorkloadError> {
        let amount = parse_amount(&config.args, AMOUNT)?;
        let transfer_amount = match optional_arg(&config.args, TRANSFER_AMOUNT) {
            Some(raw) => parse_positive_amount(raw).map_err(|source| {
                WorkloadError::InvalidArg {
                    key: TRANSFER_AMOUNT,
                    source,
                }
            })?,
            None => DEFAULT_TRANSFER_AMOUNT,
        };
        let split = match optional_arg(&config.args, SPLIT) {
            Some(raw) => raw
                .parse::<PositiveUsize>()
                .map(PositiveUsize::get)
                .map_err(|source| WorkloadError::InvalidArg { key: SPLIT, source })?,
            None => DEFAULT_SPLIT,
        };

        let identities = IdentityPool::load(&config.identities, config.concurrency)
            .map_err(|source| WorkloadError::LoadIdentities { source })?;
        let client = ctx
            .connector
            .connect(&config.host)
            .map_err(|source| WorkloadError::Connect {
                host: config.host.clone(),
                source,
            })?;

        tracing::info!(
            "generate: type={}, concurrency={}",
            KIND,
            identities.len()
        );
        Ok(Self {
            amount,
            transfer_amount: transfer_amount.to_string(),
            split,
            identities,
            client,
            initialized: false,
        })
    }
}

#[async_trait]
impl WorkloadGenerator for TransferWorkload {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn concurrency(&self) -> usize {
        self.identities.len()
    }

    async fn init(&mut self) -> Result<(), WorkloadError> {
        fund_workers(
            self.client.as_ref(),
            self.identities.funding(),
            self.identities.workers(),
            self.amount,
            self.split,
        )
        .await
        .map_err(|source| WorkloadError::Setup {
            step: SetupStep::FundWorkers,
            source,
        })?;
        self.initialized = true;
        tracing::info!("init done");
        Ok(())
    }

    async fn generate(&self, worker_id: usize) -> Result<Arc<Receipt>, WorkloadError> {
        let count = self.identities.len();
        let from = self
            .identities
            .worker(worker_id)
            .ok_or(WorkloadError::WorkerOutOfRange {
                worker: worker_id,
                concurrency: count,
            })?;
        if !self.initialized {
            return Err(WorkloadError::NotInitialized);
        }
        let next = worker_id
            .checked_add(1)
            .map_or(0, |slot| slot.checked_rem(count).unwrap_or(0));
        let to = self.identities.worker(next).unwrap_or(from);

        let receipt = self
            .client
            .transfer(
                from,
                to.address(),
                &self.transfer_amount,
                RequestOptions::not_post(),
            )
            .await
            .map_err(|source| {
                tracing::debug!("transfer error: {}, address={}", source, from.address());
                WorkloadError::Call {
                    worker: worker_id,
                    source,
                }
            })?;
        Ok(Arc::new(receipt))
    }
}
