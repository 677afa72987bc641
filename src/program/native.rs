use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LedgerError, WorkloadError};
use crate::identity::Identity;
use crate::ledger::{
    DeployRequest, InvokeRequest, LedgerClient, ModuleKind, Receipt, RequestOptions,
};

use super::config::optional_arg;
use super::{ProgramAdapter, ProgramConfig};

const RUNTIME_ARG: &str = "runtime";
const DEFAULT_RUNTIME: &str = "go";

/// Native-family program, executed by a runtime on the node (e.g. `go`).
pub struct NativeProgram {
    client: Arc<dyn LedgerClient>,
    runtime: String,
}

impl NativeProgram {
    #[must_use]
    pub fn new(client: Arc<dyn LedgerClient>, runtime: &str) -> Self {
        Self {
            client,
            runtime: runtime.to_owned(),
        }
    }

    #[must_use]
    pub fn runtime(&self) -> &str {
        &self.runtime
    }
}

/// Native build of the counter contract. The runtime comes from the
/// `runtime` argument and defaults to `go`.
///
/// # Errors
///
/// Never fails; the signature matches the program factory type.
pub fn native_counter(
    config: &ProgramConfig,
    client: Arc<dyn LedgerClient>,
) -> Result<Arc<dyn ProgramAdapter>, WorkloadError> {
    let runtime = optional_arg(&config.args, RUNTIME_ARG).unwrap_or(DEFAULT_RUNTIME);
    Ok(Arc::new(NativeProgram::new(client, runtime)))
}

#[async_trait]
impl ProgramAdapter for NativeProgram {
    fn module(&self) -> ModuleKind {
        ModuleKind::Native
    }

    fn validate_payload(&self, payload: &[u8]) -> Result<(), String> {
        if payload.is_empty() {
            return Err("native contract binary is empty".to_owned());
        }
        Ok(())
    }

    async fn publish(
        &self,
        from: &Identity,
        name: &str,
        payload: &[u8],
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let request = DeployRequest {
            module: ModuleKind::Native,
            name,
            code: payload,
            args,
            runtime: Some(&self.runtime),
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
            module: ModuleKind::Native,
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
            module: ModuleKind::Native,
            name,
            method,
            args,
        };
        self.client.query(from, request, opts).await
    }
}
