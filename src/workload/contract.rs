use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::args::PositiveUsize;
use crate::config::HarnessConfig;
use crate::error::{ErrorCategory, LedgerError, SetupStep, WorkloadError};
use crate::identity::IdentityPool;
use crate::ledger::{LedgerClient, Receipt, RequestOptions};
use crate::program::{MODULE_NAME, MethodMode, ProgramAdapter, ProgramConfig, optional_arg};

use super::funding::{fund_workers, parse_amount};
use super::{AMOUNT, BuildContext, SPLIT, WAIT_DEPLOY, WorkloadGenerator};

const KIND: &str = "contract";
const WARM_UP_WORKER: usize = 0;

/// Propagation wait after publishing when `wait_deploy` is absent or invalid.
pub const DEFAULT_WAIT_DEPLOY: Duration = Duration::from_secs(5);
/// Sub-transfers per funded worker when `split` is absent.
pub const DEFAULT_SPLIT: usize = 10;

/// Publishes a program once, then drives `call` or `read` against it from
/// every worker slot.
pub struct ContractWorkload {
    program: ProgramConfig,
    amount: u128,
    wait_deploy: Duration,
    split: usize,
    identities: IdentityPool,
    client: Arc<dyn LedgerClient>,
    adapter: Arc<dyn ProgramAdapter>,
    warm_up: Option<Arc<Receipt>>,
}

/// Workload factory for the `contract` kind.
///
/// # Errors
///
/// See [`ContractWorkload::new`].
pub fn contract(
    config: &HarnessConfig,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn WorkloadGenerator>, WorkloadError> {
    Ok(Box::new(ContractWorkload::new(config, ctx)?))
}

impl ContractWorkload {
    /// Builds the generator. The program name is resolved before identities
    /// are loaded or a connection is opened.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for missing or malformed arguments, an
    /// unknown program, identities that cannot be loaded, an unreachable host
    /// or a `module_name` that disagrees with the program family.
    pub fn new(config: &HarnessConfig, ctx: &BuildContext<'_>) -> Result<Self, WorkloadError> {
        let program = ProgramConfig::from_args(&config.args)?;
        let factory = ctx.registries.program_factory(&program.contract_name)?;

        let amount = parse_amount(&config.args, AMOUNT)?;
        let wait_deploy = parse_wait_deploy(&config.args);
        let split = parse_split(&config.args)?;

        let identities = IdentityPool::load(&config.identities, config.concurrency)
            .map_err(|source| WorkloadError::LoadIdentities { source })?;
        let client = ctx
            .connector
            .connect(&config.host)
            .map_err(|source| WorkloadError::Connect {
                host: config.host.clone(),
                source,
            })?;
        let adapter = factory(&program, Arc::clone(&client))?;

        if optional_arg(&config.args, MODULE_NAME).is_some() && adapter.module() != program.module
        {
            return Err(WorkloadError::ModuleMismatch {
                program: program.contract_name,
                expected: adapter.module().as_str(),
                configured: program.module.as_str(),
            });
        }

        tracing::info!(
            "generate: type={}, contract={}, concurrency={}",
            KIND,
            program.contract_name,
            identities.len()
        );
        Ok(Self {
            program,
            amount,
            wait_deploy,
            split,
            identities,
            client,
            adapter,
            warm_up: None,
        })
    }

    #[must_use]
    pub const fn wait_deploy(&self) -> Duration {
        self.wait_deploy
    }

    #[must_use]
    pub const fn split(&self) -> usize {
        self.split
    }

    #[must_use]
    pub const fn program(&self) -> &ProgramConfig {
        &self.program
    }

    #[must_use]
    pub const fn identities(&self) -> &IdentityPool {
        &self.identities
    }

    /// Receipt of the warm-up call, set once `init` succeeded.
    #[must_use]
    pub const fn warm_up(&self) -> Option<&Arc<Receipt>> {
        self.warm_up.as_ref()
    }

    async fn publish_program(&mut self) -> Result<(), WorkloadError> {
        let account = self.program.contract_account.as_str();
        let path = self.program.code_path.as_path();
        let bound = self
            .identities
            .funding_mut()
            .bind_contract_account(account)
            .map_err(|source| WorkloadError::BindContractAccount { source })?;

        let code = tokio::fs::read(path)
            .await
            .map_err(|source| WorkloadError::ReadCode {
                path: path.to_path_buf(),
                source,
            })?;
        self.adapter
            .validate_payload(&code)
            .map_err(|reason| WorkloadError::InvalidCode {
                path: path.to_path_buf(),
                reason,
            })?;

        let result = self
            .adapter
            .publish(
                &bound,
                &self.program.contract_name,
                &code,
                &self.program.args,
                RequestOptions::default(),
            )
            .await;
        drop(bound);
        tolerate_conflict(result, SetupStep::Publish, &self.program.contract_name)?;
        tracing::info!("deploy contract done");
        Ok(())
    }
}

#[async_trait]
impl WorkloadGenerator for ContractWorkload {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn concurrency(&self) -> usize {
        self.identities.len()
    }

    async fn init(&mut self) -> Result<(), WorkloadError> {
        let account = self.program.contract_account.clone();
        let amount = self.amount.to_string();

        let created = self
            .client
            .create_contract_account(self.identities.funding(), &account)
            .await;
        tolerate_conflict(created, SetupStep::CreateAccount, &account)?;

        self.client
            .transfer(
                self.identities.funding(),
                &account,
                &amount,
                RequestOptions::default(),
            )
            .await
            .map_err(|source| WorkloadError::Setup {
                step: SetupStep::FundAccount,
                source,
            })?;

        self.publish_program().await?;

        tracing::info!(
            "waiting {}s for contract propagation",
            self.wait_deploy.as_secs()
        );
        tokio::time::sleep(self.wait_deploy).await;

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

        let worker = self
            .identities
            .worker(WARM_UP_WORKER)
            .ok_or(WorkloadError::WorkerOutOfRange {
                worker: WARM_UP_WORKER,
                concurrency: self.identities.len(),
            })?;
        let receipt = self
            .adapter
            .call(
                worker,
                &self.program.contract_name,
                &self.program.method_invoke_name,
                &id_args(WARM_UP_WORKER),
                RequestOptions::default(),
            )
            .await
            .map_err(|source| {
                tracing::warn!(
                    "invoke contract error: {}, address={}",
                    source,
                    worker.address()
                );
                WorkloadError::Setup {
                    step: SetupStep::WarmUp,
                    source,
                }
            })?;
        self.warm_up = Some(Arc::new(receipt));
        tracing::info!("init done");
        Ok(())
    }

    async fn generate(&self, worker_id: usize) -> Result<Arc<Receipt>, WorkloadError> {
        let from = self
            .identities
            .worker(worker_id)
            .ok_or(WorkloadError::WorkerOutOfRange {
                worker: worker_id,
                concurrency: self.identities.len(),
            })?;
        let warm_up = self.warm_up.as_ref().ok_or(WorkloadError::NotInitialized)?;
        let args = id_args(worker_id);
        let name = self.program.contract_name.as_str();

        match self.program.method_mode {
            MethodMode::Query => {
                self.adapter
                    .read(
                        from,
                        name,
                        &self.program.method_query_name,
                        &args,
                        RequestOptions::not_post(),
                    )
                    .await
                    .map_err(|source| call_error(worker_id, from.address(), source))?;
                Ok(Arc::clone(warm_up))
            }
            MethodMode::Invoke => {
                let receipt = self
                    .adapter
                    .call(
                        from,
                        name,
                        &self.program.method_invoke_name,
                        &args,
                        RequestOptions::not_post(),
                    )
                    .await
                    .map_err(|source| call_error(worker_id, from.address(), source))?;
                Ok(Arc::new(receipt))
            }
        }
    }
}

fn id_args(worker_id: usize) -> BTreeMap<String, String> {
    BTreeMap::from([("id".to_owned(), worker_id.to_string())])
}

fn call_error(worker: usize, address: &str, source: LedgerError) -> WorkloadError {
    tracing::debug!("contract call error: {}, address={}", source, address);
    WorkloadError::Call { worker, source }
}

/// Treats an already-provisioned resource as success.
fn tolerate_conflict(
    result: Result<Receipt, LedgerError>,
    step: SetupStep,
    subject: &str,
) -> Result<(), WorkloadError> {
    let Err(source) = result else {
        return Ok(());
    };
    let err = WorkloadError::Setup { step, source };
    if err.category() == ErrorCategory::ProvisioningConflict {
        tracing::info!("{} skipped, {} already exists", step, subject);
        return Ok(());
    }
    Err(err)
}

fn parse_wait_deploy(args: &BTreeMap<String, String>) -> Duration {
    optional_arg(args, WAIT_DEPLOY)
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_WAIT_DEPLOY, Duration::from_secs)
}

fn parse_split(args: &BTreeMap<String, String>) -> Result<usize, WorkloadError> {
    optional_arg(args, SPLIT).map_or(Ok(DEFAULT_SPLIT), |value| {
        value
            .parse::<PositiveUsize>()
            .map(PositiveUsize::get)
            .map_err(|source| WorkloadError::InvalidArg { key: SPLIT, source })
    })
}
