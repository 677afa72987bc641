use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::*;
use crate::args::PositiveUsize;
use crate::config::RunBounds;
use crate::error::{ErrorCategory, LedgerError};
use crate::identity::{Identity, IdentitySource};
use crate::ledger::{InMemoryConnector, InMemoryLedger, ModuleKind, Receipt, RequestOptions};

struct MarkerWorkload(&'static str);

#[async_trait]
impl WorkloadGenerator for MarkerWorkload {
    fn kind(&self) -> &'static str {
        self.0
    }

    fn concurrency(&self) -> usize {
        1
    }

    async fn init(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }

    async fn generate(&self, _worker_id: usize) -> Result<Arc<Receipt>, WorkloadError> {
        Ok(Arc::new(Receipt::default()))
    }
}

fn first_marker(
    _config: &HarnessConfig,
    _ctx: &BuildContext<'_>,
) -> Result<Box<dyn WorkloadGenerator>, WorkloadError> {
    Ok(Box::new(MarkerWorkload("first")))
}

fn second_marker(
    _config: &HarnessConfig,
    _ctx: &BuildContext<'_>,
) -> Result<Box<dyn WorkloadGenerator>, WorkloadError> {
    Ok(Box::new(MarkerWorkload("second")))
}

struct EvmProgram;

#[async_trait]
impl ProgramAdapter for EvmProgram {
    fn module(&self) -> ModuleKind {
        ModuleKind::Evm
    }

    async fn publish(
        &self,
        _from: &Identity,
        _name: &str,
        _payload: &[u8],
        _args: &BTreeMap<String, String>,
        _opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        Ok(Receipt::default())
    }

    async fn call(
        &self,
        _from: &Identity,
        _name: &str,
        _method: &str,
        _args: &BTreeMap<String, String>,
        _opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        Ok(Receipt::default())
    }

    async fn read(
        &self,
        _from: &Identity,
        _name: &str,
        _method: &str,
        _args: &BTreeMap<String, String>,
        _opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        Ok(Receipt::default())
    }
}

fn evm_program(
    _config: &ProgramConfig,
    client: Arc<dyn LedgerClient>,
) -> Result<Arc<dyn ProgramAdapter>, WorkloadError> {
    drop(client);
    Ok(Arc::new(EvmProgram))
}

fn harness(workload: &str) -> Result<HarnessConfig, String> {
    Ok(HarnessConfig {
        host: "memory://".to_owned(),
        concurrency: PositiveUsize::try_from(1).map_err(|err| err.to_string())?,
        workload: workload.to_owned(),
        args: BTreeMap::new(),
        identities: IdentitySource::Derived { seed: 1 },
        bounds: RunBounds::default(),
    })
}

#[test]
fn builtins_are_registered() {
    let registries = Registries::with_builtins();
    assert_eq!(registries.workloads().keys(), vec!["contract", "transfer"]);
    assert_eq!(
        registries.programs().keys(),
        vec!["counter", "native_counter", "short_content"]
    );
}

#[test]
fn resolve_returns_registered_factory() -> Result<(), String> {
    let mut registries = Registries::empty();
    registries.register_workload("marker", first_marker);
    let connector = InMemoryConnector::new(Arc::new(InMemoryLedger::recording()));

    let generator = registries
        .build_workload(&harness("marker")?, &connector)
        .map_err(|err| err.to_string())?;
    assert_eq!(generator.kind(), "first");
    Ok(())
}

#[test]
fn last_registration_wins() -> Result<(), String> {
    let mut registries = Registries::empty();
    registries.register_workload("marker", first_marker);
    registries.register_workload("marker", second_marker);
    assert_eq!(registries.workloads().len(), 1);

    let connector = InMemoryConnector::new(Arc::new(InMemoryLedger::recording()));
    let generator = registries
        .build_workload(&harness("marker")?, &connector)
        .map_err(|err| err.to_string())?;
    assert_eq!(generator.kind(), "second");
    Ok(())
}

#[test]
fn unknown_workload_is_configuration_error() -> Result<(), String> {
    let registries = Registries::with_builtins();
    let connector = InMemoryConnector::new(Arc::new(InMemoryLedger::recording()));
    let Err(err) = registries.build_workload(&harness("mint")?, &connector) else {
        return Err("expected unknown workload error".to_owned());
    };
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("contract, transfer"));
    assert_eq!(connector.connections(), 0);
    Ok(())
}

#[test]
fn unknown_program_lists_available_names() -> Result<(), String> {
    let registries = Registries::with_builtins();
    let Err(WorkloadError::UnknownProgram { name, available }) =
        registries.program_factory("erc20")
    else {
        return Err("expected unknown program error".to_owned());
    };
    assert_eq!(name, "erc20");
    assert_eq!(available, "counter, native_counter, short_content");
    Ok(())
}

#[test]
fn program_factory_resolves_custom_registration() -> Result<(), String> {
    let mut registries = Registries::with_builtins();
    registries.register_program("token", evm_program);
    let factory = registries
        .program_factory("token")
        .map_err(|err| err.to_string())?;

    let args: BTreeMap<String, String> = [
        ("contract_name", "token"),
        ("contract_account", "XC1111111111111111@xuper"),
        ("code_path", "token.bin"),
        ("method_invoke_name", "transfer"),
    ]
    .iter()
    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
    .collect();
    let config = ProgramConfig::from_args(&args).map_err(|err| err.to_string())?;
    let adapter =
        factory(&config, Arc::new(InMemoryLedger::recording())).map_err(|err| err.to_string())?;
    assert_eq!(adapter.module(), ModuleKind::Evm);
    Ok(())
}

#[test]
fn empty_registry_reports_nothing_available() {
    let registries = Registries::empty();
    assert!(registries.workloads().is_empty());
    assert!(matches!(
        registries.workload_factory("contract"),
        Err(WorkloadError::UnknownWorkload { ref available, .. }) if available.is_empty()
    ));
}
