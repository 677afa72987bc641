//! Program adapters: `publish`, `call` and `read` over a named on-chain
//! program, one implementation per program family.
mod config;
mod native;
mod validate;
mod wasm;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::identity::Identity;
use crate::ledger::{ModuleKind, Receipt, RequestOptions};

pub use config::{
    CODE_PATH, CONTRACT_ACCOUNT, CONTRACT_NAME, METHOD_INVOKE_NAME, METHOD_QUERY_NAME, METHOD_TYPE,
    MODULE_NAME, MethodMode, ProgramConfig,
};
pub(crate) use config::optional_arg;
pub use native::{NativeProgram, native_counter};
pub use wasm::{WasmProgram, counter, short_content};

#[async_trait]
pub trait ProgramAdapter: Send + Sync {
    /// Module family this adapter deploys and calls.
    fn module(&self) -> ModuleKind;

    /// Checks a payload before it is published.
    ///
    /// # Errors
    ///
    /// Returns a description of why the payload cannot be published.
    fn validate_payload(&self, payload: &[u8]) -> Result<(), String> {
        let _ = payload;
        Ok(())
    }

    /// Publishes `payload` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyExists`] when `name` is already bound,
    /// which callers may treat as success.
    async fn publish(
        &self,
        from: &Identity,
        name: &str,
        payload: &[u8],
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;

    /// State-mutating invocation.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    async fn call(
        &self,
        from: &Identity,
        name: &str,
        method: &str,
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;

    /// Non-mutating invocation, normally issued with
    /// [`RequestOptions::not_post`].
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    async fn read(
        &self,
        from: &Identity,
        name: &str,
        method: &str,
        args: &BTreeMap<String, String>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;
}
