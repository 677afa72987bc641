use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LedgerError, WorkloadError};
use crate::identity::Identity;
use crate::ledger::{
    DeployRequest, InvokeRequest, LedgerClient, ModuleKind, Receipt, RequestOptions,
};

use super::config::optional_arg;
use super::validate::validate_wasm_payload;
use super::{ProgramAdapter, ProgramConfig};

const DEFAULT_CREATOR: &str = "xchain";

/// WASM-family program. Deploy arguments are the caller's arguments layered
/// over the program's own init arguments.
pub struct WasmProgram {
    client: Arc<dyn LedgerClient>,
    init_args: BTreeMap<String, String>,
}

impl WasmProgram {
    #[must_use]
    pub fn new(client: Arc<dyn LedgerClient>, init_args: BTreeMap<String, String>) -> Self {
        Self { client, init_args }
    }
}

/// The `counter` contract; its constructor takes a `creator`.
///
/// # Errors
///
/// Never fails; the signature matches the program factory type.
pub fn counter(
    config: &ProgramConfig,
    client: Arc<dyn LedgerClient>,
) -> Result<Arc<dyn ProgramAdapter>, WorkloadError> {
    let creator = optional_arg(&config.args, "creator").unwrap_or(DEFAULT_CREATOR);
    let init_args = BTreeMap::from([("creator".to_owned(), creator.to_owned())]);
    Ok(Arc::new(WasmProgram::new(client, init_args)))
}

/// The `short_content` contract; no constructor arguments.
///
/// # Errors
///
/// Never fails; the signature matches the program factory type.
pub fn short_content(
    _config: &ProgramConfig,
    client: Arc<dyn LedgerClient>,
) -> Result<Arc<dyn ProgramAdapter>, WorkloadError> {
    Ok(Arc::new(WasmProgram::new(client, BTreeMap::new())))
}

#[async_trait]
impl ProgramAdapter for WasmProgram {
    fn module(&self) -> ModuleKind {
        ModuleKind::Wasm
    }

    fn validate_payload(&self, payload: &[u8]) -> Result<(), String> {
        validate_wasm_payload(payload)
    }

    async fn publish(
        &self,
        from: &Identity,
        name: &str,
        payload: &[u8],
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let mut deploy_args = self.init_args.clone();
        deploy_args.extend(args.iter().map(|(key, value)| (key.clone(), value.clone())));
        let request = DeployRequest {
            module: ModuleKind::Wasm,
            name,
            code: payload,
            args: &deploy_args,
            runtime: None,
        };
        self.client.deploy(from, request, opts).await
    }

    async fn call(
        &self,
        from: &Identity,
        name: &str,
        method: &str,
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let request = InvokeRequest {
            module: ModuleKind::Wasm,
            name,
            method,
            args,
        };
        self.client.invoke(from, request, opts).await
    }

    async fn read(
        &self,
        from: &Identity,
        name: &str,
        method: &str,
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let request = InvokeRequest {
            module: ModuleKind::Wasm,
            name,
            method,
            args,
        };
        self.client.query(from, request, opts).await
    }
}
