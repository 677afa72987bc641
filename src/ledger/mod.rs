//! Capability surface of the ledger backend.
//!
//! The harness only needs five operations: create a contract account,
//! transfer, deploy, invoke and query. [`LedgerClient`] expresses exactly that;
//! [`Connector`] opens a client for a host string so generators can be built
//! against a real gateway or the in-process [`InMemoryLedger`].
mod http;
mod memory;


use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, ValidationError};
use crate::identity::Identity;

pub use http::HttpLedgerClient;
pub use memory::{InMemoryConnector, InMemoryLedger, Operation, RecordedCall};

const MEMORY_SCHEME: &str = "memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Wasm,
    Native,
    Evm,
}

impl ModuleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Wasm => "wasm",
            ModuleKind::Native => "native",
            ModuleKind::Evm => "evm",
        }
    }
}

impl std::str::FromStr for ModuleKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wasm" => Ok(ModuleKind::Wasm),
            "native" => Ok(ModuleKind::Native),
            "evm" => Ok(ModuleKind::Evm),
            _ => Err(ValidationError::InvalidModuleKind {
                value: s.to_owned(),
            }),
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// When false the backend computes the result without broadcasting it.
    pub post: bool,
}

impl RequestOptions {
    #[must_use]
    pub const fn not_post() -> Self {
        Self { post: false }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { post: true }
    }
}

/// Opaque result of a backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Receipt {
    #[serde(alias = "txid")]
    pub tx_id: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy)]
pub struct DeployRequest<'req> {
    pub module: ModuleKind,
    pub name: &'req str,
    pub code: &'req [u8],
    pub args: &'req BTreeMap<String, String>,
    /// Runtime descriptor for native modules (e.g. `go`).
    pub runtime: Option<&'req str>,
}

#[derive(Debug, Clone, Copy)]
pub struct InvokeRequest<'req> {
    pub module: ModuleKind,
    pub name: &'req str,
    pub method: &'req str,
    pub args: &'req BTreeMap<String, String>,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Creates `account`, owned by `from`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyExists`] when the account exists, or any
    /// transport/backend error.
    async fn create_contract_account(
        &self,
        from: &Identity,
        account: &str,
    ) -> Result<Receipt, LedgerError>;

    /// Transfers `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport error.
    async fn transfer(
        &self,
        from: &Identity,
        to: &str,
        amount: &str,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;

    /// Deploys a contract under `from`'s bound contract account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyExists`] when the name is taken, or any
    /// transport/backend error.
    async fn deploy(
        &self,
        from: &Identity,
        request: DeployRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;

    /// Invokes a state-mutating contract method.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport error.
    async fn invoke(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;

    /// Runs a read-only contract method.
    ///
    /// # Errors
    ///
    /// Returns the backend or transport error.
    async fn query(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError>;
}

pub trait Connector: Send + Sync {
    /// Opens a client for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is malformed or uses an unknown scheme.
    fn connect(&self, host: &str) -> Result<Arc<dyn LedgerClient>, LedgerError>;
}

/// Connects `http(s)://` hosts to the JSON gateway and `memory://` to a fresh
/// in-process ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnector;

impl Connector for DefaultConnector {
    fn connect(&self, host: &str) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        let scheme = host
            .split_once("://")
            .map_or("", |(scheme, _)| scheme)
            .to_ascii_lowercase();
        match scheme.as_str() {
            MEMORY_SCHEME => Ok(Arc::new(InMemoryLedger::new())),
            "http" | "https" => Ok(Arc::new(HttpLedgerClient::connect(host)?)),
            _ => Err(LedgerError::UnsupportedScheme { scheme }),
        }
    }
}
